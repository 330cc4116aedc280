//! Unit tests for the spatial graph.

#[cfg(test)]
mod units {
    use fl_core::{UnitId, UnitKey, Value};

    use crate::{Repository, SpatialError};

    #[test]
    fn add_and_find() {
        let mut repo = Repository::new();
        let i = repo.add_unit("SU", UnitId(3), 1).unwrap();
        let unit = repo.find("SU", UnitId(3)).unwrap();
        assert_eq!(unit.index(), i);
        assert_eq!(unit.key(), &UnitKey::new("SU", 3));
        assert!(repo.class_exists("SU"));
        assert!(!repo.class_exists("RS"));
        assert_eq!(repo.unit_count(), 1);
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(1), 5).unwrap();
        let err = repo.add_unit("SU", UnitId(1), 9).unwrap_err();
        assert_eq!(err, SpatialError::AlreadyExists(UnitKey::new("SU", 1)));
        assert_eq!(repo.find("SU", UnitId(1)).unwrap().process_order(), 5);
        // Same id in another class is a different unit.
        assert!(repo.add_unit("RS", UnitId(1), 1).is_ok());
    }

    #[test]
    fn remove_detaches_edges_and_keeps_slot() {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(1), 1).unwrap();
        repo.add_unit("SU", UnitId(2), 1).unwrap();
        repo.add_unit("RS", UnitId(1), 1).unwrap();
        let su1 = UnitKey::new("SU", 1);
        let su2 = UnitKey::new("SU", 2);
        let rs1 = UnitKey::new("RS", 1);
        repo.add_from_to(&su1, &su2).unwrap();
        repo.add_child_parent(&su2, &rs1).unwrap();

        repo.remove_unit(&su2).unwrap();
        assert!(repo.get(&su2).is_none());
        assert!(repo.get(&su1).unwrap().to_units().is_empty());
        assert!(repo.get(&rs1).unwrap().child_units().is_empty());
        assert_eq!(repo.unit_count(), 2);
        assert_eq!(repo.slot_count(), 3);

        let i = repo.add_unit("SU", UnitId(2), 1).unwrap();
        assert_eq!(i.0, 3);
    }

    #[test]
    fn removing_last_unit_drops_class() {
        let mut repo = Repository::new();
        repo.add_unit("RS", UnitId(1), 1).unwrap();
        repo.remove_unit(&UnitKey::new("RS", 1)).unwrap();
        assert!(!repo.class_exists("RS"));
        assert!(repo.remove_unit(&UnitKey::new("RS", 1)).is_err());
    }

    #[test]
    fn input_data() {
        let mut repo = Repository::new();
        let i = repo.add_unit("SU", UnitId(1), 1).unwrap();
        assert_eq!(repo.set_input_data(i, "area", Value::Real(12.5)).unwrap(), None);
        assert_eq!(repo.input_data(i, "area"), Some(&Value::Real(12.5)));
        assert_eq!(repo.input_data(i, "slope"), None);
    }
}

#[cfg(test)]
mod connections {
    use fl_core::{UnitId, UnitKey};

    use crate::{Repository, SpatialError};

    fn two_units() -> (Repository, UnitKey, UnitKey) {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(1), 1).unwrap();
        repo.add_unit("SU", UnitId(2), 1).unwrap();
        (repo, UnitKey::new("SU", 1), UnitKey::new("SU", 2))
    }

    #[test]
    fn from_to_is_directed_and_mirrored() {
        let (mut repo, a, b) = two_units();
        assert!(repo.add_from_to(&a, &b).unwrap());
        assert!(repo.is_connected_to(&a, &b));
        assert!(repo.is_connected_from(&b, &a));
        assert!(!repo.is_connected_to(&b, &a));
    }

    #[test]
    fn duplicate_edge_is_noop() {
        let (mut repo, a, b) = two_units();
        assert!(repo.add_from_to(&a, &b).unwrap());
        assert!(!repo.add_from_to(&a, &b).unwrap());
        assert_eq!(repo.get(&a).unwrap().to_units().len(), 1);
        assert_eq!(repo.get(&b).unwrap().from_units().len(), 1);
    }

    #[test]
    fn remove_edge() {
        let (mut repo, a, b) = two_units();
        repo.add_child_parent(&a, &b).unwrap();
        assert!(repo.is_child_of(&a, &b));
        assert!(repo.is_parent_of(&b, &a));
        assert!(repo.remove_child_parent(&a, &b).unwrap());
        assert!(!repo.remove_child_parent(&a, &b).unwrap());
        assert!(!repo.is_child_of(&a, &b));
        assert!(repo.get(&b).unwrap().child_units().is_empty());
    }

    #[test]
    fn self_loop_and_unknown_rejected() {
        let (mut repo, a, _) = two_units();
        assert_eq!(repo.add_from_to(&a, &a).unwrap_err(), SpatialError::SelfLoop(a.clone()));
        let ghost = UnitKey::new("SU", 99);
        assert_eq!(repo.add_from_to(&a, &ghost).unwrap_err(), SpatialError::UnknownUnit(ghost.clone()));
        assert!(!repo.is_connected_to(&a, &ghost));
    }
}

#[cfg(test)]
mod order {
    use fl_core::{UnitId, UnitIndex, UnitKey};

    use crate::Repository;

    #[test]
    fn stable_sort_by_process_order() {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(1), 2).unwrap(); // slot 0
        repo.add_unit("SU", UnitId(2), 1).unwrap(); // slot 1
        repo.add_unit("RS", UnitId(1), 1).unwrap(); // slot 2
        repo.add_unit("SU", UnitId(3), 1).unwrap(); // slot 3
        assert!(repo.is_order_dirty());

        repo.sort_by_process_order();
        assert!(!repo.is_order_dirty());
        assert_eq!(&*repo.units_in_process_order(), &[UnitIndex(1), UnitIndex(2), UnitIndex(3), UnitIndex(0)]);
        assert_eq!(&*repo.class_in_process_order("SU"), &[UnitIndex(1), UnitIndex(3), UnitIndex(0)]);
        assert!(repo.class_in_process_order("XX").is_empty());
    }

    #[test]
    fn dirty_order_is_recomputed() {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(1), 1).unwrap();
        repo.add_unit("SU", UnitId(2), 2).unwrap();
        repo.sort_by_process_order();
        repo.set_process_order(&UnitKey::new("SU", 2), 0).unwrap();
        assert!(repo.is_order_dirty());
        assert_eq!(&*repo.class_in_process_order("SU"), &[UnitIndex(1), UnitIndex(0)]);
    }

    #[test]
    fn declaration_order_kept() {
        let mut repo = Repository::new();
        for id in [5, 2, 9] {
            repo.add_unit("SU", UnitId(id), 1).unwrap();
        }
        let ids: Vec<u32> = repo.units_of_class("SU").map(|u| u.id().0).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }
}

#[cfg(test)]
mod grid {
    use fl_core::{UnitId, UnitKey};

    use crate::{Repository, SpatialError};

    #[test]
    fn three_by_three_neighbours() {
        let mut repo = Repository::new();
        let cells = repo.build_grid("SU", 3, 3, 1).unwrap();
        assert_eq!(cells.len(), 9);

        let degree = |id: u32| repo.find("SU", UnitId(id)).unwrap().to_units().len();
        assert_eq!(degree(5), 4); // centre
        assert_eq!(degree(2), 3); // edge
        assert_eq!(degree(1), 2); // corner

        let edges: usize = repo.units().map(|u| u.to_units().len()).sum();
        assert_eq!(edges, 24); // 12 adjacencies, both directions
        assert!(repo.is_connected_to(&UnitKey::new("SU", 1), &UnitKey::new("SU", 4)));
        assert!(!repo.is_connected_to(&UnitKey::new("SU", 3), &UnitKey::new("SU", 4)));
    }

    #[test]
    fn clash_leaves_repository_unchanged() {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(4), 1).unwrap();
        let err = repo.build_grid("SU", 2, 2, 1).unwrap_err();
        assert_eq!(err, SpatialError::AlreadyExists(UnitKey::new("SU", 4)));
        assert_eq!(repo.unit_count(), 1);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let mut repo = Repository::new();
        let err = repo.build_grid("SU", 70_000, 70_000, 1).unwrap_err();
        assert_eq!(err, SpatialError::GridTooLarge { rows: 70_000, cols: 70_000 });
        assert_eq!(repo.unit_count(), 0);
    }
}

#[cfg(test)]
mod dot {
    use fl_core::{UnitId, UnitKey};

    use crate::Repository;

    #[test]
    fn edges_rendered() {
        let mut repo = Repository::new();
        repo.add_unit("SU", UnitId(1), 1).unwrap();
        repo.add_unit("SU", UnitId(2), 1).unwrap();
        repo.add_unit("RS", UnitId(1), 1).unwrap();
        repo.add_from_to(&UnitKey::new("SU", 1), &UnitKey::new("SU", 2)).unwrap();
        repo.add_child_parent(&UnitKey::new("SU", 2), &UnitKey::new("RS", 1)).unwrap();

        let dot = repo.to_dot();
        assert!(dot.starts_with("digraph units {"));
        assert!(dot.contains("\"SU#1\" -> \"SU#2\";"));
        assert!(dot.contains("\"SU#2\" -> \"RS#1\" [style=dashed];"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
