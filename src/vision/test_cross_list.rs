/// 十字鏈表後端測試
///
/// 軸匹配計數、物理可見性與移除級聯
#[cfg(test)]
mod tests {
    use crate::comp::base::{EntityId, PlayerId};
    use crate::comp::phys::Pos;
    use crate::vision::cross_list::{CrossListManager, DIM};
    use crate::vision::manager::AoiManager;

    fn mgr() -> CrossListManager {
        CrossListManager::new()
    }

    /// 計數打滿三軸才物理可見（P2）
    #[test]
    fn test_counter_reaches_dim_means_visible() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 10.0).unwrap();
        m.add_entity(EntityId(2), Pos::new(4.0, 3.0, -4.0), 5.0).unwrap();

        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), DIM);
        assert!(m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));
        assert_eq!(m.hit_count(EntityId(2), EntityId(1)), DIM);
        assert!(m.visible_of(EntityId(2)).unwrap().contains(&EntityId(1)));

        // 只在一條軸外就看不見
        m.move_entity(EntityId(2), Pos::new(50.0, 3.0, -4.0)).unwrap();
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), DIM - 1);
        assert!(!m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));
    }

    /// 部分重疊只累積部分計數，不可見
    #[test]
    fn test_partial_overlap_counts() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 10.0).unwrap();
        // X 在範圍外，Y/Z 在範圍內
        m.add_entity(EntityId(2), Pos::new(25.0, 0.0, 0.0), 0.0).unwrap();
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), 2);
        assert!(m.visible_of(EntityId(1)).unwrap().is_empty());
    }

    /// range = 0 的實體只被觀察、自己看不到任何東西，也不會看到自己
    #[test]
    fn test_zero_range_is_target_only() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 0.0).unwrap();
        m.add_entity(EntityId(2), Pos::new(1.0, 0.0, 0.0), 5.0).unwrap();

        assert!(m.visible_of(EntityId(1)).unwrap().is_empty());
        assert!(m.visible_of(EntityId(2)).unwrap().contains(&EntityId(1)));
        assert_eq!(m.hit_count(EntityId(1), EntityId(1)), 0);
        assert_eq!(m.hit_count(EntityId(2), EntityId(2)), 0);
    }

    /// 三條軸在每個操作後都維持排序（P3）
    #[test]
    fn test_axes_stay_sorted() {
        let mut m = mgr();
        // 這個嵌套盒模式曾在來源實作讓上界節點卡在錯位
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 10.0).unwrap();
        m.add_entity(EntityId(2), Pos::new(50.0, 0.0, 0.0), 5.0).unwrap();
        m.add_entity(EntityId(3), Pos::new(45.0, 0.0, 0.0), 10.0).unwrap();
        for axis in 0..3 {
            assert!(m.axis(axis).is_sorted(), "axis {} unsorted after adds", axis);
        }

        m.move_entity(EntityId(1), Pos::new(45.0, 0.0, 0.0)).unwrap();
        m.move_entity(EntityId(2), Pos::new(-20.0, 7.0, 3.0)).unwrap();
        m.move_entity(EntityId(3), Pos::new(4.0, -9.0, 60.0)).unwrap();
        for axis in 0..3 {
            assert!(m.axis(axis).is_sorted(), "axis {} unsorted after moves", axis);
        }
    }

    /// 一步跳得比自己視野還遠，計數不得殘留（歸零防禦不可吃掉合法遞減）
    #[test]
    fn test_long_jump_keeps_counters_exact() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 5.0).unwrap();
        m.add_entity(EntityId(2), Pos::new(3.0, 0.0, 0.0), 0.0).unwrap();
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), DIM);

        // 跳到 100（遠超過 range 5），目標落在舊盒與新盒之間
        m.move_entity(EntityId(1), Pos::new(100.0, 0.0, 0.0)).unwrap();
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), DIM - 1);
        assert!(!m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));

        // 跳回來要能完整恢復
        m.move_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), DIM);
        assert!(m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));
    }

    /// 原地移動是無操作（P7）
    #[test]
    fn test_move_to_same_position_is_noop() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(2.0, 3.0, 4.0), 10.0).unwrap();
        m.add_entity(EntityId(2), Pos::new(5.0, 3.0, 4.0), 10.0).unwrap();
        let before = m.visible_of(EntityId(1)).unwrap().clone();

        m.move_entity(EntityId(1), Pos::new(2.0, 3.0, 4.0)).unwrap();
        assert_eq!(m.visible_of(EntityId(1)).unwrap(), &before);
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), DIM);
        for axis in 0..3 {
            assert!(m.axis(axis).is_sorted());
        }
    }

    /// 移除後完整還原（P8）：計數、可見集合與鏈表長度
    #[test]
    fn test_remove_restores_pre_add_state() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 10.0).unwrap();
        let len_before = [m.axis(0).len(), m.axis(1).len(), m.axis(2).len()];

        m.add_entity(EntityId(2), Pos::new(1.0, 1.0, 1.0), 10.0).unwrap();
        assert!(m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));

        m.remove_entity(EntityId(2));
        assert!(m.visible_of(EntityId(1)).unwrap().is_empty());
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), 0);
        assert_eq!(
            [m.axis(0).len(), m.axis(1).len(), m.axis(2).len()],
            len_before
        );
        for axis in 0..3 {
            assert!(m.axis(axis).is_sorted());
        }
    }

    /// 重複加入與未知 ID 都靜默忽略
    #[test]
    fn test_duplicate_add_and_unknown_ids_ignored() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 10.0).unwrap();
        m.add_entity(EntityId(1), Pos::new(99.0, 99.0, 99.0), 1.0).unwrap();
        // 位置仍是第一次的
        m.add_entity(EntityId(2), Pos::new(3.0, 0.0, 0.0), 0.0).unwrap();
        assert!(m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));

        m.move_entity(EntityId(77), Pos::new(1.0, 1.0, 1.0)).unwrap();
        m.remove_entity(EntityId(77));
        m.subscribe(PlayerId(9), EntityId(1));
        m.unsubscribe(PlayerId(9), EntityId(1));
    }

    /// NaN 座標與負視野範圍要被拒絕且不留狀態
    #[test]
    fn test_bad_input_rejected() {
        let mut m = mgr();
        assert!(m
            .add_entity(EntityId(1), Pos::new(f64::NAN, 0.0, 0.0), 1.0)
            .is_err());
        assert!(m
            .add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), -1.0)
            .is_err());
        for axis in 0..3 {
            assert_eq!(m.axis(axis).len(), 0);
        }

        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 1.0).unwrap();
        assert!(m
            .move_entity(EntityId(1), Pos::new(0.0, f64::INFINITY, 0.0))
            .is_err());
        // 拒絕後位置不變
        m.add_entity(EntityId(2), Pos::new(0.5, 0.0, 0.0), 0.0).unwrap();
        assert!(m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));
    }

    /// 引用計數恆等於「看得到目標的綁定實體數」（P1）
    #[test]
    fn test_refcount_matches_observer_count() {
        let mut m = mgr();
        let p = PlayerId(1);
        m.add_player(p);
        m.add_entity(EntityId(1), Pos::new(-5.0, 0.0, 0.0), 10.0).unwrap();
        m.add_entity(EntityId(2), Pos::new(5.0, 0.0, 0.0), 10.0).unwrap();
        m.subscribe(p, EntityId(1));
        m.subscribe(p, EntityId(2));
        m.add_entity(EntityId(9), Pos::new(0.0, 0.0, 0.0), 0.0).unwrap();

        let seen_by = [EntityId(1), EntityId(2)]
            .iter()
            .filter(|o| m.visible_of(**o).unwrap().contains(&EntityId(9)))
            .count() as u32;
        assert_eq!(seen_by, 2);
        let player = m.aggregator().player(p).unwrap();
        assert_eq!(player.final_view.get(&EntityId(9)).copied(), Some(seen_by));

        m.move_entity(EntityId(1), Pos::new(-50.0, 0.0, 0.0)).unwrap();
        let player = m.aggregator().player(p).unwrap();
        assert_eq!(player.final_view.get(&EntityId(9)).copied(), Some(1));
    }

    /// 邊界貼齊：目標剛好落在觀察盒邊緣時不產生自發的進出抖動
    #[test]
    fn test_boundary_alignment_is_stable() {
        let mut m = mgr();
        m.add_entity(EntityId(1), Pos::new(0.0, 0.0, 0.0), 10.0).unwrap();
        // 目標正好在 x = 10 的上界上
        m.add_entity(EntityId(2), Pos::new(10.0, 0.0, 0.0), 0.0).unwrap();
        let on_edge = m.hit_count(EntityId(1), EntityId(2));

        // 原地重算不可改變計數
        m.move_entity(EntityId(2), Pos::new(10.0, 0.0, 0.0)).unwrap();
        assert_eq!(m.hit_count(EntityId(1), EntityId(2)), on_edge);

        // 離開邊界一定看不見，回到內側一定看得見
        m.move_entity(EntityId(2), Pos::new(10.5, 0.0, 0.0)).unwrap();
        assert!(!m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));
        m.move_entity(EntityId(2), Pos::new(9.5, 0.0, 0.0)).unwrap();
        assert!(m.visible_of(EntityId(1)).unwrap().contains(&EntityId(2)));
    }
}
