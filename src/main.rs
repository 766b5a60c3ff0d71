use log::{debug, info};
use rand::Rng;
use std::time::Duration;

use aoi_system::config::CONFIG;
use aoi_system::{
    create_manager, AoiEvent, BackendConfig, ChannelCallback, Clock, EntityId, GridConfig,
    PlayerId, Pos,
};

const HERO_ID: i64 = 100;
const WARD_ID: i64 = 200;

struct NpcState {
    vx: f64,
    vz: f64,
    /// 下次改變方向的 tick
    change_tick: u64,
}

fn main() -> Result<(), failure::Error> {
    log4rs::init_file("log4rs.yml", Default::default()).unwrap();

    let backend = match CONFIG.BACKEND.as_str() {
        "cross_list" => BackendConfig::CrossList,
        _ => BackendConfig::Grid(GridConfig {
            grid_size: CONFIG.GRID_SIZE,
            min_x: CONFIG.MIN_X,
            min_z: CONFIG.MIN_Z,
            max_x: CONFIG.MAX_X,
            max_z: CONFIG.MAX_Z,
        }),
    };
    let mut mgr = create_manager(backend)?;

    let (cb, events) = ChannelCallback::new();
    mgr.set_callback(Some(Box::new(cb)));

    let map_size = CONFIG.MAX_X as f64;
    let mut rng = rand::thread_rng();

    // NPC（隨機走動）
    let mut npcs = vec![];
    for i in 1..=CONFIG.NPC_COUNT {
        let id = EntityId(i);
        let pos = Pos::new(
            rng.gen_range(0.0..map_size),
            0.0,
            rng.gen_range(0.0..map_size),
        );
        mgr.add_entity(id, pos, CONFIG.NPC_RANGE)?;
        npcs.push((id, pos, NpcState { vx: 0.0, vz: 0.0, change_tick: 0 }));
    }

    // 主角與靜止的眼，視野都歸玩家 100
    let player = PlayerId(HERO_ID);
    mgr.add_player(player);
    mgr.add_entity(
        EntityId(HERO_ID),
        Pos::new(map_size / 2.0, 0.0, map_size / 2.0),
        CONFIG.HERO_RANGE,
    )?;
    mgr.add_entity(
        EntityId(WARD_ID),
        Pos::new(map_size / 4.0, 0.0, map_size / 4.0),
        CONFIG.HERO_RANGE,
    )?;
    mgr.subscribe(player, EntityId(HERO_ID));
    mgr.subscribe(player, EntityId(WARD_ID));

    info!(
        "aoi demo started: backend={} npcs={} tps={}",
        CONFIG.BACKEND, CONFIG.NPC_COUNT, CONFIG.TPS
    );

    let speed = 3.0;
    let mut clock = Clock::new(Duration::from_secs_f64(1.0 / CONFIG.TPS as f64));
    let mut tick: u64 = 0;
    let mut hero_angle: f64 = 0.0;

    loop {
        tick += 1;

        for (id, pos, state) in npcs.iter_mut() {
            if tick >= state.change_tick {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                state.vx = angle.cos() * speed;
                state.vz = angle.sin() * speed;
                state.change_tick = tick + rng.gen_range(CONFIG.TPS..CONFIG.TPS * 4);
            }

            let mut x = pos.0.x + state.vx;
            let mut z = pos.0.z + state.vz;
            // 邊界反彈
            if x <= 0.0 || x >= map_size {
                state.vx = -state.vx;
                x = pos.0.x + state.vx;
            }
            if z <= 0.0 || z >= map_size {
                state.vz = -state.vz;
                z = pos.0.z + state.vz;
            }
            *pos = Pos::new(x, 0.0, z);
            mgr.move_entity(*id, *pos)?;
        }

        // 主角繞著地圖中心巡邏
        hero_angle += 0.02;
        let r = map_size / 4.0;
        mgr.move_entity(
            EntityId(HERO_ID),
            Pos::new(
                map_size / 2.0 + hero_angle.cos() * r,
                0.0,
                map_size / 2.0 + hero_angle.sin() * r,
            ),
        )?;

        for event in events.try_iter() {
            match event {
                AoiEvent::Enter { watcher, target } => {
                    info!("player {} sees {}", watcher, target)
                }
                AoiEvent::Leave { watcher, target } => {
                    info!("player {} lost {}", watcher, target)
                }
            }
        }

        if tick % (CONFIG.TPS * 5) == 0 {
            let snap = mgr.debug_snapshot();
            debug!("snapshot: {}", serde_json::to_string(&snap)?);
        }

        clock.tick();
    }
}
