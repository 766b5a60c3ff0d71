use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::comp::base::{EntityId, PlayerId};
use crate::comp::phys::Pos;
use crate::vision::aggregate::ViewAggregator;

// === DTO，給調試前端的 JSON 序列化 ===

/// 某一時刻的深拷貝快照
///
/// 必須在遊戲主邏輯線程中生成（引擎非併發安全）。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugSnapshot {
    pub time: String,
    #[serde(rename = "ents")]
    pub entities: Vec<DebugEntity>,
    #[serde(rename = "rels")]
    pub relations: Vec<DebugRelation>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugEntity {
    pub id: i64,
    /// "player" 或 "npc"
    #[serde(rename = "type")]
    pub kind: String,
    pub pos: [f64; 3],
    /// 以長方體陣列傳給前端，方便之後支援非正方視野
    pub range: [f64; 3],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugRelation {
    #[serde(rename = "wid")]
    pub watcher: i64,
    #[serde(rename = "tid")]
    pub target: i64,
}

/// 由實體表與聚合層組出快照
///
/// 與玩家同號的實體視為 "player"（常見的綁定方式），其視野關係
/// 取自該玩家的 final_view。
pub fn build<I>(entities: I, agg: &ViewAggregator) -> DebugSnapshot
where
    I: Iterator<Item = (EntityId, Pos, f64)>,
{
    let mut snap = DebugSnapshot {
        time: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        entities: vec![],
        relations: vec![],
    };

    for (id, pos, range) in entities {
        let mut kind = "npc";
        if let Some(player) = agg.player(PlayerId(id.0)) {
            kind = "player";
            for target in player.final_view.keys() {
                snap.relations.push(DebugRelation {
                    watcher: id.0,
                    target: target.0,
                });
            }
        }
        snap.entities.push(DebugEntity {
            id: id.0,
            kind: kind.to_string(),
            pos: [pos.0.x, pos.0.y, pos.0.z],
            range: [range, range, range],
        });
    }

    snap
}
