use hashbrown::HashMap;
use log::debug;

use crate::comp::base::{EntityId, PlayerId};
use crate::comp::player::Player;
use crate::comp::set::OrderedSet;
use crate::vision::manager::AoiCallback;

/// 訂閱與視野聚合層
///
/// 後端只回報物理層的進出（觀察者 × 目標）；這一層把事件攤派給
/// 觀察者的訂閱玩家，維護每位玩家 final_view 的引用計數，並只在
/// 0↔1 穿越時對外發 OnEnter / OnLeave。
///
/// 玩家自己綁定的實體不會作為目標出現在它的 final_view 中。
#[derive(Default)]
pub struct ViewAggregator {
    players: HashMap<PlayerId, Player>,
    callback: Option<Box<dyn AoiCallback>>,
}

impl ViewAggregator {
    pub fn new() -> Self {
        ViewAggregator {
            players: HashMap::new(),
            callback: None,
        }
    }

    /// 註冊玩家；重複註冊不影響既有視野
    pub fn add_player(&mut self, id: PlayerId) {
        if !self.players.contains_key(&id) {
            self.players.insert(id, Player::new(id));
        }
    }

    pub fn has_player(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn set_callback(&mut self, cb: Option<Box<dyn AoiCallback>>) {
        self.callback = cb;
    }

    /// 目前可見的目標集合（快照複本）；未知玩家回傳空集合
    pub fn view_of(&self, id: PlayerId) -> OrderedSet<EntityId> {
        match self.players.get(&id) {
            Some(p) => p.view(),
            None => OrderedSet::new(),
        }
    }

    pub fn can_see(&self, watcher: PlayerId, target: EntityId) -> bool {
        self.players
            .get(&watcher)
            .map(|p| p.can_see(target))
            .unwrap_or(false)
    }

    /// 把一次物理進出攤派給觀察者的全部訂閱玩家
    pub fn notify(&mut self, subscribers: &OrderedSet<PlayerId>, target: EntityId, enter: bool) {
        let delta = if enter { 1 } else { -1 };
        for pid in subscribers.iter() {
            self.ref_count_change(*pid, target, delta);
        }
    }

    /// 玩家引用計數變更
    ///
    /// 計數歸零即刪除條目；只有 0→正 與 正→0 會對外發事件。
    /// 目標若是該玩家目前綁定的實體則整筆忽略。
    pub fn ref_count_change(&mut self, pid: PlayerId, target: EntityId, delta: i64) {
        let player = match self.players.get_mut(&pid) {
            Some(p) => p,
            None => return,
        };
        if player.observers.contains(&target) {
            return;
        }

        let old = player.final_view.get(&target).copied().unwrap_or(0) as i64;
        let new = old + delta;

        if new <= 0 {
            player.final_view.remove(&target);
        } else {
            player.final_view.insert(target, new as u32);
        }

        if let Some(cb) = self.callback.as_mut() {
            if old == 0 && new > 0 {
                cb.on_enter(pid, target);
            } else if old > 0 && new <= 0 {
                cb.on_leave(pid, target);
            }
        }
    }

    /// 建立玩家 → 實體的綁定
    ///
    /// 綁定後該實體不再是此玩家的視野目標；若其他來源已讓它出現在
    /// final_view，這裡會將其移除並補一個 OnLeave 維持事件交替。
    pub fn begin_observe(&mut self, pid: PlayerId, eid: EntityId) {
        let player = match self.players.get_mut(&pid) {
            Some(p) => p,
            None => return,
        };
        player.observers.insert(eid);
        if player.final_view.remove(&eid).is_some() {
            debug!("player {} retires bound entity {} from view", pid, eid);
            if let Some(cb) = self.callback.as_mut() {
                cb.on_leave(pid, eid);
            }
        }
    }

    /// 解除綁定；不回補既有視野，之後由真實的物理穿越重新宣告
    pub fn end_observe(&mut self, pid: PlayerId, eid: EntityId) {
        if let Some(player) = self.players.get_mut(&pid) {
            player.observers.remove(&eid);
        }
    }
}
