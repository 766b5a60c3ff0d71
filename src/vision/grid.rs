use hashbrown::HashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::comp::base::{EntityId, PlayerId};
use crate::comp::phys::Pos;
use crate::comp::set::OrderedSet;
use crate::vision::aggregate::ViewAggregator;
use crate::vision::manager::{check_position, check_range, AoiCallback, AoiError, AoiManager};
use crate::vision::snapshot::{self, DebugSnapshot};

/// 格子後端設定；涵蓋 [min_x, max_x] × [min_z, max_z]
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    pub grid_size: i32,
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl GridConfig {
    fn validate(&self) -> Result<(), AoiError> {
        if self.grid_size <= 0 {
            return Err(AoiError::BadGridConfig {
                reason: format!("grid_size {} must be positive", self.grid_size),
            });
        }
        if self.max_x < self.min_x || self.max_z < self.min_z {
            return Err(AoiError::BadGridConfig {
                reason: format!(
                    "bounds [{}, {}] x [{}, {}] are inverted",
                    self.min_x, self.max_x, self.min_z, self.max_z
                ),
            });
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        ((self.max_x - self.min_x) / self.grid_size + 1) as usize
    }

    fn cols(&self) -> usize {
        ((self.max_z - self.min_z) / self.grid_size + 1) as usize
    }
}

/// 格子後端的物理單位；Y 軸忽略
#[derive(Clone, Debug)]
pub struct GridEntity {
    pub pos: Pos,
    /// 目前物理上看見的集合（同格或相鄰格）
    pub visible: OrderedSet<EntityId>,
    /// 哪些玩家訂閱了我的視野
    pub subscribers: OrderedSet<PlayerId>,
}

/// 均勻格子雜湊 AOI 管理器
///
/// 可見性是「互在對方的九宮格內」的對稱關係，進出事件成對回報；
/// 越界座標夾到最近的合法格子，實體不會無聲消失。
pub struct GridManager {
    cfg: GridConfig,
    rows: usize,
    cols: usize,
    cells: Vec<OrderedSet<EntityId>>,
    entities: HashMap<EntityId, GridEntity>,
    agg: ViewAggregator,
}

impl GridManager {
    pub fn new(cfg: GridConfig) -> Result<Self, AoiError> {
        cfg.validate()?;
        let (rows, cols) = (cfg.rows(), cfg.cols());
        Ok(GridManager {
            cfg,
            rows,
            cols,
            cells: vec![OrderedSet::new(); rows * cols],
            entities: HashMap::new(),
            agg: ViewAggregator::new(),
        })
    }

    pub fn visible_of(&self, id: EntityId) -> Option<&OrderedSet<EntityId>> {
        self.entities.get(&id).map(|e| &e.visible)
    }

    pub fn aggregator(&self) -> &ViewAggregator {
        &self.agg
    }

    /// 座標所在的格子（行、列），越界時夾到邊緣
    pub fn cell_of(&self, pos: &Pos) -> (usize, usize) {
        let row = (pos.0.x as i32 - self.cfg.min_x) / self.cfg.grid_size;
        let col = (pos.0.z as i32 - self.cfg.min_z) / self.cfg.grid_size;
        let row = row.clamp(0, self.rows as i32 - 1) as usize;
        let col = col.clamp(0, self.cols as i32 - 1) as usize;
        (row, col)
    }

    fn cell_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// 九宮格內的其他實體（不含自己，地圖邊緣少於九格）
    fn surround(&self, pos: &Pos, exclude: EntityId) -> OrderedSet<EntityId> {
        let (row, col) = self.cell_of(pos);
        let mut set = OrderedSet::new();
        for i in row.saturating_sub(1)..=(row + 1).min(self.rows - 1) {
            for j in col.saturating_sub(1)..=(col + 1).min(self.cols - 1) {
                for id in self.cells[self.cell_index(i, j)].iter() {
                    if *id != exclude {
                        set.insert(*id);
                    }
                }
            }
        }
        set
    }

    /// 對稱的物理 Enter：雙方都把對方納入視野並各自攤派訂閱者
    fn pair_enter(&mut self, a: EntityId, b: EntityId) {
        let Self { entities, agg, .. } = self;
        if let Some(ea) = entities.get_mut(&a) {
            ea.visible.insert(b);
            agg.notify(&ea.subscribers, b, true);
        }
        if let Some(eb) = entities.get_mut(&b) {
            eb.visible.insert(a);
            agg.notify(&eb.subscribers, a, true);
        }
    }

    /// 對稱的物理 Leave
    fn pair_leave(&mut self, a: EntityId, b: EntityId) {
        let Self { entities, agg, .. } = self;
        if let Some(ea) = entities.get_mut(&a) {
            ea.visible.remove(&b);
            agg.notify(&ea.subscribers, b, false);
        }
        if let Some(eb) = entities.get_mut(&b) {
            eb.visible.remove(&a);
            agg.notify(&eb.subscribers, a, false);
        }
    }
}

impl AoiManager for GridManager {
    fn add_player(&mut self, id: PlayerId) {
        self.agg.add_player(id);
    }

    fn add_entity(&mut self, id: EntityId, pos: Pos, range: f64) -> Result<(), AoiError> {
        check_position(&pos)?;
        // 格子後端的可見半徑固定是一格，range 只做輸入檢查
        check_range(id, range)?;
        if self.entities.contains_key(&id) {
            return Ok(());
        }

        let (row, col) = self.cell_of(&pos);
        let idx = self.cell_index(row, col);
        self.cells[idx].insert(id);
        self.entities.insert(
            id,
            GridEntity {
                pos,
                visible: OrderedSet::new(),
                subscribers: OrderedSet::new(),
            },
        );
        debug!("grid: add entity {} in cell ({}, {})", id, row, col);

        for other in self.surround(&pos, id).iter() {
            self.pair_enter(id, *other);
        }
        Ok(())
    }

    fn move_entity(&mut self, id: EntityId, pos: Pos) -> Result<(), AoiError> {
        check_position(&pos)?;
        let old_pos = match self.entities.get(&id) {
            Some(e) => e.pos,
            None => return Ok(()),
        };

        let old_cell = self.cell_of(&old_pos);
        let new_cell = self.cell_of(&pos);
        if old_cell == new_cell {
            // 同格移動只更新座標
            if let Some(e) = self.entities.get_mut(&id) {
                e.pos = pos;
            }
            return Ok(());
        }

        // 換格前先取舊九宮格，再換格、更新座標、取新九宮格
        let old_aoi = self.surround(&old_pos, id);
        let old_idx = self.cell_index(old_cell.0, old_cell.1);
        let new_idx = self.cell_index(new_cell.0, new_cell.1);
        self.cells[old_idx].remove(&id);
        self.cells[new_idx].insert(id);
        if let Some(e) = self.entities.get_mut(&id) {
            e.pos = pos;
        }
        let new_aoi = self.surround(&pos, id);

        for other in old_aoi.difference(&new_aoi).iter() {
            self.pair_leave(id, *other);
        }
        for other in new_aoi.difference(&old_aoi).iter() {
            self.pair_enter(id, *other);
        }
        Ok(())
    }

    fn remove_entity(&mut self, id: EntityId) {
        let (pos, subscribers) = match self.entities.get(&id) {
            Some(e) => (e.pos, e.subscribers.clone()),
            None => return,
        };
        debug!("grid: remove entity {}", id);

        for other in self.surround(&pos, id).iter() {
            self.pair_leave(id, *other);
        }

        for pid in subscribers.iter() {
            self.agg.end_observe(*pid, id);
        }

        let (row, col) = self.cell_of(&pos);
        let idx = self.cell_index(row, col);
        self.cells[idx].remove(&id);
        self.entities.remove(&id);
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
        let range = self.cfg.grid_size as f64;
        snapshot::build(
            self.entities.iter().map(|(id, e)| (*id, e.pos, range)),
            &self.agg,
        )
    }
}
