use crossbeam_channel::{unbounded, Receiver, Sender};
use failure::Fail;
use serde::{Deserialize, Serialize};

use crate::comp::base::{EntityId, PlayerId};
use crate::comp::phys::Pos;
use crate::comp::set::OrderedSet;
use crate::vision::cross_list::CrossListManager;
use crate::vision::grid::{GridConfig, GridManager};
use crate::vision::snapshot::DebugSnapshot;

/// 視野引擎的輸入錯誤
///
/// 未知 ID、重複加入、重複訂閱一律靜默忽略；只有壞輸入會被
/// 拒絕，而且拒絕時不改動任何狀態。
#[derive(Debug, Fail)]
pub enum AoiError {
    #[fail(display = "position has a non-finite component: ({}, {}, {})", x, y, z)]
    BadPosition { x: f64, y: f64, z: f64 },
    #[fail(display = "negative view range {} for entity {}", range, id)]
    BadRange { id: EntityId, range: f64 },
    #[fail(display = "invalid grid config: {}", reason)]
    BadGridConfig { reason: String },
}

/// 回調接口：處理視野進出事件
///
/// 事件在變更操作執行中同步送出；回調內不可再呼叫同一個管理器。
pub trait AoiCallback {
    /// watcher 看到了 target
    fn on_enter(&mut self, watcher: PlayerId, target: EntityId);
    /// watcher 看不見 target 了
    fn on_leave(&mut self, watcher: PlayerId, target: EntityId);
}

/// AOI 管理器統一介面
///
/// 兩種後端（格子 / 三軸十字鏈表）實作同一份合約，建構時選定。
/// 單寫者使用；所有操作都在呼叫內同步完成。
pub trait AoiManager {
    /// 註冊玩家；重複註冊為無操作
    fn add_player(&mut self, id: PlayerId);
    /// 添加物理單位；`range = 0` 表示只被觀察、自己沒有視野
    fn add_entity(&mut self, id: EntityId, pos: Pos, range: f64) -> Result<(), AoiError>;
    /// 移動物理單位；未知 ID 為無操作
    fn move_entity(&mut self, id: EntityId, pos: Pos) -> Result<(), AoiError>;
    /// 移除物理單位並送出對應的離開事件；未知 ID 為無操作
    fn remove_entity(&mut self, id: EntityId);
    /// 玩家訂閱實體的視野；冪等
    fn subscribe(&mut self, player: PlayerId, entity: EntityId);
    /// 取消訂閱；冪等
    fn unsubscribe(&mut self, player: PlayerId, entity: EntityId);
    /// 獲取視野內所有目標 ID（快照複本）
    fn get_view(&self, player: PlayerId) -> OrderedSet<EntityId>;
    /// watcher 是否能看見 target
    fn can_see(&self, watcher: PlayerId, target: EntityId) -> bool;
    /// 設置上層業務回調；`None` 表示丟棄事件
    fn set_callback(&mut self, cb: Option<Box<dyn AoiCallback>>);
    /// 生成當前時刻的深拷貝快照（調試用）
    fn debug_snapshot(&self) -> DebugSnapshot;
}

/// 後端選擇
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BackendConfig {
    /// 三軸十字鏈表；無參數
    CrossList,
    /// 均勻格子雜湊
    Grid(GridConfig),
}

/// 依設定建構管理器
pub fn create_manager(cfg: BackendConfig) -> Result<Box<dyn AoiManager>, AoiError> {
    match cfg {
        BackendConfig::CrossList => Ok(Box::new(CrossListManager::new())),
        BackendConfig::Grid(grid_cfg) => Ok(Box::new(GridManager::new(grid_cfg)?)),
    }
}

/// 視野進出事件（通道形式）
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AoiEvent {
    Enter { watcher: PlayerId, target: EntityId },
    Leave { watcher: PlayerId, target: EntityId },
}

/// 把回調轉成事件流的轉接器
///
/// 接收端消失後事件靜默丟棄。
pub struct ChannelCallback {
    tx: Sender<AoiEvent>,
}

impl ChannelCallback {
    pub fn new() -> (ChannelCallback, Receiver<AoiEvent>) {
        let (tx, rx) = unbounded();
        (ChannelCallback { tx }, rx)
    }
}

impl AoiCallback for ChannelCallback {
    fn on_enter(&mut self, watcher: PlayerId, target: EntityId) {
        let _ = self.tx.send(AoiEvent::Enter { watcher, target });
    }

    fn on_leave(&mut self, watcher: PlayerId, target: EntityId) {
        let _ = self.tx.send(AoiEvent::Leave { watcher, target });
    }
}

/// 共用的輸入檢查
pub(crate) fn check_position(pos: &Pos) -> Result<(), AoiError> {
    if pos.is_finite() {
        Ok(())
    } else {
        Err(AoiError::BadPosition {
            x: pos.0.x,
            y: pos.0.y,
            z: pos.0.z,
        })
    }
}

pub(crate) fn check_range(id: EntityId, range: f64) -> Result<(), AoiError> {
    if range.is_finite() && range >= 0.0 {
        Ok(())
    } else {
        Err(AoiError::BadRange { id, range })
    }
}
