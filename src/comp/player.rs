use hashbrown::HashMap;

use crate::comp::base::{EntityId, PlayerId};
use crate::comp::set::OrderedSet;

/// 玩家（邏輯層）
///
/// 視野的訂閱者，本身沒有座標；聚合其綁定實體回報的視野。
/// `final_view` 的 key 集合即玩家目前可見的目標，value 是引用計數
/// （有多少個綁定實體看見了這個目標），永遠不存 0。
#[derive(Clone, Debug, Default)]
pub struct Player {
    pub id: PlayerId,
    pub final_view: HashMap<EntityId, u32>,
    /// 目前綁定為視野來源的實體；這些實體不會作為目標出現在 final_view 中
    pub observers: OrderedSet<EntityId>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Player {
            id,
            final_view: HashMap::new(),
            observers: OrderedSet::new(),
        }
    }

    /// 目前可見的目標集合（快照複本）
    pub fn view(&self) -> OrderedSet<EntityId> {
        self.final_view.keys().copied().collect()
    }

    pub fn can_see(&self, target: EntityId) -> bool {
        self.final_view.get(&target).copied().unwrap_or(0) > 0
    }
}
