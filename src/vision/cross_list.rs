use hashbrown::HashMap;
use log::debug;

use crate::comp::base::{EntityId, PlayerId};
use crate::comp::phys::Pos;
use crate::comp::set::OrderedSet;
use crate::vision::aggregate::ViewAggregator;
use crate::vision::axis_list::{AxisList, Crossing, MarkerKind};
use crate::vision::manager::{check_position, check_range, AoiCallback, AoiError, AoiManager};
use crate::vision::snapshot::{self, DebugSnapshot};

/// 軸數；計數器落在 [0, DIM]，等於 DIM 即物理可見
pub const DIM: i64 = 3;

/// 十字鏈表後端的物理單位
#[derive(Clone, Debug)]
pub struct AxisEntity {
    pub pos: Pos,
    /// 視野半徑（立方體半邊長）；0 表示只被觀察
    pub range: f64,
    /// 鏈表節點索引: [3個軸][Min/Max/Pos]
    markers: [[usize; 3]; 3],
    /// 軸匹配計數器，0 不保存
    hits: HashMap<EntityId, u8>,
    /// 物理上真正看見的集合（hits == DIM 的子集）
    pub visible: OrderedSet<EntityId>,
    /// 哪些玩家訂閱了我的視野
    pub subscribers: OrderedSet<PlayerId>,
}

/// 三軸十字鏈表 AOI 管理器
///
/// 每個實體在每條軸上掛三個節點（下界、位置、上界），移動時只
/// 對值變更的節點做氣泡交換；界線節點與位置節點互相穿越時依符
/// 號表增減軸匹配計數，計數打滿三軸即物理可見。
pub struct CrossListManager {
    axes: [AxisList; 3],
    entities: HashMap<EntityId, AxisEntity>,
    agg: ViewAggregator,
}

impl CrossListManager {
    pub fn new() -> Self {
        CrossListManager {
            axes: [AxisList::new(), AxisList::new(), AxisList::new()],
            entities: HashMap::new(),
            agg: ViewAggregator::new(),
        }
    }

    /// 觀察者目前物理上看見的集合
    pub fn visible_of(&self, id: EntityId) -> Option<&OrderedSet<EntityId>> {
        self.entities.get(&id).map(|e| &e.visible)
    }

    /// 軸匹配計數（無條目即 0）
    pub fn hit_count(&self, watcher: EntityId, target: EntityId) -> i64 {
        self.entities
            .get(&watcher)
            .and_then(|e| e.hits.get(&target))
            .copied()
            .unwrap_or(0) as i64
    }

    pub fn axis(&self, axis: usize) -> &AxisList {
        &self.axes[axis]
    }

    pub fn aggregator(&self) -> &ViewAggregator {
        &self.agg
    }

    /// 把三條軸上的九個節點更新到新位置
    ///
    /// 每條軸先動擴張的那一側界線再動收縮側，最後動位置節點；
    /// 這樣任何一對（觀察者, 目標）的計數全程落在 [0, DIM]，
    /// 歸零防禦永遠不會吃掉合法的遞減。
    fn update_markers(&mut self, id: EntityId, new_pos: Pos) {
        let (markers, range) = match self.entities.get(&id) {
            Some(e) => (e.markers, e.range),
            None => return,
        };
        let Self { axes, entities, agg } = self;

        for axis in 0..3 {
            let target = new_pos.axis(axis);
            let cur = axes[axis].value(markers[axis][MarkerKind::Pos as usize]);
            if target == cur {
                continue;
            }
            let order = if target > cur {
                [MarkerKind::Max, MarkerKind::Min, MarkerKind::Pos]
            } else {
                [MarkerKind::Min, MarkerKind::Max, MarkerKind::Pos]
            };
            for kind in order {
                let val = match kind {
                    MarkerKind::Min => target - range,
                    MarkerKind::Max => target + range,
                    MarkerKind::Pos => target,
                };
                axes[axis].update(markers[axis][kind as usize], val, |c| {
                    Self::apply_crossing(entities, agg, c)
                });
            }
        }
    }

    /// 核心穿越邏輯
    fn apply_crossing(
        entities: &mut HashMap<EntityId, AxisEntity>,
        agg: &mut ViewAggregator,
        c: &Crossing,
    ) {
        // 忽略自己
        if c.mover_owner == c.passed_owner {
            return;
        }

        // 識別誰是觀察者界線，誰是目標位置
        let (watcher_kind, watcher_id, target_id, watcher_moved) =
            match (c.mover_kind, c.passed_kind) {
                (MarkerKind::Min, MarkerKind::Pos) | (MarkerKind::Max, MarkerKind::Pos) => {
                    (c.mover_kind, c.mover_owner, c.passed_owner, true)
                }
                (MarkerKind::Pos, MarkerKind::Min) | (MarkerKind::Pos, MarkerKind::Max) => {
                    (c.passed_kind, c.passed_owner, c.mover_owner, false)
                }
                // 界線穿界線、位置穿位置：不影響可見性
                _ => return,
            };

        // 符號表：
        // Min 向右過 Pos -> Leave   Min 向左過 Pos -> Enter
        // Max 向右過 Pos -> Enter   Max 向左過 Pos -> Leave
        // Pos 向右過 Min -> Enter   Pos 向左過 Min -> Leave
        // Pos 向右過 Max -> Leave   Pos 向左過 Max -> Enter
        let enter = match watcher_kind {
            MarkerKind::Min => {
                if watcher_moved {
                    !c.moving_right
                } else {
                    c.moving_right
                }
            }
            _ => {
                if watcher_moved {
                    c.moving_right
                } else {
                    !c.moving_right
                }
            }
        };

        let watcher = match entities.get_mut(&watcher_id) {
            Some(w) => w,
            None => return,
        };
        let old = watcher.hits.get(&target_id).copied().unwrap_or(0) as i64;
        let new = old + if enter { 1 } else { -1 };

        // 歸零即刪（防禦性夾在 0，避免計數外洩）
        if new <= 0 {
            watcher.hits.remove(&target_id);
        } else {
            watcher.hits.insert(target_id, new as u8);
        }

        if old < DIM && new == DIM {
            // 三軸全部進入：物理 Enter
            watcher.visible.insert(target_id);
            agg.notify(&watcher.subscribers, target_id, true);
        } else if old == DIM && new < DIM {
            // 物理 Leave
            watcher.visible.remove(&target_id);
            agg.notify(&watcher.subscribers, target_id, false);
        }
    }
}

impl AoiManager for CrossListManager {
    fn add_player(&mut self, id: PlayerId) {
        self.agg.add_player(id);
    }

    fn add_entity(&mut self, id: EntityId, pos: Pos, range: f64) -> Result<(), AoiError> {
        check_position(&pos)?;
        check_range(id, range)?;
        if self.entities.contains_key(&id) {
            return Ok(());
        }

        // 節點以 +∞ 掛在尾哨兵前，再由一次正常的更新掃到定位；
        // 掃描途中的穿越就是這個實體的初始可見性事件
        let mut markers = [[0usize; 3]; 3];
        for axis in 0..3 {
            for kind in [MarkerKind::Min, MarkerKind::Max, MarkerKind::Pos] {
                markers[axis][kind as usize] = self.axes[axis].insert_before_tail(kind, id);
            }
        }
        self.entities.insert(
            id,
            AxisEntity {
                pos,
                range,
                markers,
                hits: HashMap::new(),
                visible: OrderedSet::new(),
                subscribers: OrderedSet::new(),
            },
        );
        debug!("cross-list: add entity {} range {}", id, range);
        self.update_markers(id, pos);
        Ok(())
    }

    fn move_entity(&mut self, id: EntityId, pos: Pos) -> Result<(), AoiError> {
        check_position(&pos)?;
        match self.entities.get_mut(&id) {
            Some(e) => e.pos = pos,
            None => return Ok(()),
        }
        self.update_markers(id, pos);
        Ok(())
    }

    fn remove_entity(&mut self, id: EntityId) {
        let e = match self.entities.remove(&id) {
            Some(e) => e,
            None => return,
        };
        debug!("cross-list: remove entity {}", id);

        // 1. 此實體自身視野的丟失
        for t in e.visible.iter() {
            self.agg.notify(&e.subscribers, *t, false);
        }

        // 2. 其他觀察者對它的計數與可見性
        let Self { axes, entities, agg } = self;
        for (_, o) in entities.iter_mut() {
            if let Some(cnt) = o.hits.remove(&id) {
                if cnt as i64 == DIM {
                    o.visible.remove(&id);
                    agg.notify(&o.subscribers, id, false);
                }
            }
        }

        // 3. 斷開訂閱關係
        for pid in e.subscribers.iter() {
            agg.end_observe(*pid, id);
        }

        // 4. 物理斷開；不需要最後排序
        for axis in 0..3 {
            for kind in 0..3 {
                axes[axis].remove(e.markers[axis][kind]);
            }
        }
    }

    fn subscribe(&mut self, player: PlayerId, entity: EntityId) {
        if !self.agg.has_player(player) {
            return;
        }
        let e = match self.entities.get_mut(&entity) {
            Some(e) => e,
            None => return,
        };
        if !e.subscribers.insert(player) {
            return;
        }
        self.agg.begin_observe(player, entity);
        // 立即同步當前物理視野
        for t in e.visible.iter() {
            self.agg.ref_count_change(player, *t, 1);
        }
    }

    fn unsubscribe(&mut self, player: PlayerId, entity: EntityId) {
        if !self.agg.has_player(player) {
            return;
        }
        let e = match self.entities.get_mut(&entity) {
            Some(e) => e,
            None => return,
        };
        if !e.subscribers.remove(&player) {
            return;
        }
        self.agg.end_observe(player, entity);
        // 立即移除這個來源的貢獻
        for t in e.visible.iter() {
            self.agg.ref_count_change(player, *t, -1);
        }
    }

    fn get_view(&self, player: PlayerId) -> OrderedSet<EntityId> {
        self.agg.view_of(player)
    }

    fn can_see(&self, watcher: PlayerId, target: EntityId) -> bool {
        self.agg.can_see(watcher, target)
    }

    fn set_callback(&mut self, cb: Option<Box<dyn AoiCallback>>) {
        self.agg.set_callback(cb);
    }

    fn debug_snapshot(&self) -> DebugSnapshot {
        snapshot::build(
            self.entities.iter().map(|(id, e)| (*id, e.pos, e.range)),
            &self.agg,
        )
    }
}

impl Default for CrossListManager {
    fn default() -> Self {
        Self::new()
    }
}
