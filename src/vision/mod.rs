/// 視野系統模組
///
/// 管理實體的區域視野（AOI）、訂閱聚合與進出事件
pub mod aggregate;
pub mod axis_list;
pub mod cross_list;
pub mod grid;
pub mod manager;
pub mod snapshot;
pub mod test_cross_list;

pub use self::{
    aggregate::ViewAggregator,
    axis_list::{AxisList, Crossing, MarkerKind},
    cross_list::CrossListManager,
    grid::{GridConfig, GridManager},
    manager::{
        create_manager, AoiCallback, AoiError, AoiEvent, AoiManager, BackendConfig,
        ChannelCallback,
    },
    snapshot::{DebugEntity, DebugRelation, DebugSnapshot},
};
