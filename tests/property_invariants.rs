use proptest::prelude::*;

use modelctl::{
    ctrl::facade::ControllerFacade,
    entity::{ClassifierRecord, EntitySnapshot, FeatureRecord},
    error::CtrlError,
    persist::sqlite::SqliteStore,
    stats::Statistics,
    types::{BoundaryPolicy, ClassifierType, FeatureType, RowId},
};

#[derive(Debug, Clone)]
enum Action {
    CreateClassifier { new_group: bool },
    CreateFeature { target: u8, new_group: bool },
    Rename { target: u8 },
    Move { target: u8, x: i32, y: i32 },
    SetValue { target: u8, value: u16 },
    DeleteClassifier { target: u8 },
    DeleteFeature { target: u8 },
    BeginGroup,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        any::<bool>().prop_map(|new_group| Action::CreateClassifier { new_group }),
        (any::<u8>(), any::<bool>()).prop_map(|(target, new_group)| Action::CreateFeature { target, new_group }),
        any::<u8>().prop_map(|target| Action::Rename { target }),
        (any::<u8>(), -500i32..500, -500i32..500).prop_map(|(target, x, y)| Action::Move { target, x, y }),
        (any::<u8>(), any::<u16>()).prop_map(|(target, value)| Action::SetValue { target, value }),
        any::<u8>().prop_map(|target| Action::DeleteClassifier { target }),
        any::<u8>().prop_map(|target| Action::DeleteFeature { target }),
        Just(Action::BeginGroup),
    ]
}

fn policy(new_group: bool) -> BoundaryPolicy {
    if new_group { BoundaryPolicy::StartNew } else { BoundaryPolicy::Append }
}

fn pick(ids: &[RowId], target: u8) -> Option<(usize, RowId)> {
    if ids.is_empty() {
        return None;
    }
    let idx = usize::from(target) % ids.len();
    Some((idx, ids[idx]))
}

fn rows(f: &ControllerFacade<SqliteStore>) -> Vec<EntitySnapshot> {
    f.store().export_rows().expect("export")
}

/// Expected undo steps: store rows before each group and its entry count.
#[derive(Default)]
struct Groups {
    bases: Vec<Vec<EntitySnapshot>>,
    sizes: Vec<u32>,
}

impl Groups {
    fn open(&mut self, base: Vec<EntitySnapshot>) {
        self.drop_empty();
        self.bases.push(base);
        self.sizes.push(0);
    }

    fn record(&mut self, entries: u32) {
        if self.sizes.is_empty() {
            // Edits before any boundary form a group over the empty store.
            self.open(Vec::new());
        }
        if let Some(last) = self.sizes.last_mut() {
            *last += entries;
        }
    }

    fn drop_empty(&mut self) {
        if self.sizes.last() == Some(&0) {
            self.sizes.pop();
            self.bases.pop();
        }
    }
}

fn step(f: &mut ControllerFacade<SqliteStore>, forward: bool) -> Statistics {
    let mut stats = Statistics::new();
    if forward {
        f.redo(&mut stats).expect("redo");
    } else {
        f.undo(&mut stats).expect("undo");
    }
    stats
}

proptest! {
    #[test]
    fn undo_and_redo_step_through_recorded_groups(
        actions in prop::collection::vec(action_strategy(), 1..80),
        pivot in 0usize..64,
    ) {
        let mut f = ControllerFacade::new(SqliteStore::open_in_memory().expect("open"));
        let mut groups = Groups::default();
        let mut classifiers: Vec<RowId> = Vec::new();
        let mut features: Vec<RowId> = Vec::new();
        let mut serial = 0u32;

        for action in actions {
            serial += 1;
            match action {
                Action::CreateClassifier { new_group } => {
                    if new_group {
                        groups.open(rows(&f));
                    }
                    let rec = ClassifierRecord::new(ClassifierType::Class, format!("C{serial}"));
                    let id = f.classifiers().create_classifier(rec, policy(new_group)).expect("create classifier");
                    classifiers.push(id);
                    groups.record(1);
                }
                Action::CreateFeature { target, new_group } => {
                    if let Some((_, owner)) = pick(&classifiers, target) {
                        if new_group {
                            groups.open(rows(&f));
                        }
                        let rec = FeatureRecord::new(owner, FeatureType::Property, format!("f{serial}"));
                        let id = f.classifiers().create_feature(rec, policy(new_group)).expect("create feature");
                        features.push(id);
                        groups.record(1);
                    }
                }
                Action::Rename { target } => {
                    if let Some((_, id)) = pick(&classifiers, target) {
                        f.classifiers().update_classifier_name(id, format!("R{serial}")).expect("rename");
                        groups.record(1);
                    }
                }
                Action::Move { target, x, y } => {
                    if let Some((_, id)) = pick(&classifiers, target) {
                        f.classifiers().update_classifier_x_order(id, x).expect("x");
                        f.classifiers().update_classifier_y_order(id, y).expect("y");
                        groups.record(2);
                    }
                }
                Action::SetValue { target, value } => {
                    if let Some((_, id)) = pick(&features, target) {
                        f.classifiers().update_feature_value(id, value.to_string()).expect("value");
                        groups.record(1);
                    }
                }
                Action::DeleteClassifier { target } => {
                    if let Some((idx, id)) = pick(&classifiers, target) {
                        groups.open(rows(&f));
                        f.classifiers().delete_classifier(id, BoundaryPolicy::StartNew).expect("delete classifier");
                        classifiers.swap_remove(idx);
                        groups.record(1);
                    }
                }
                Action::DeleteFeature { target } => {
                    if let Some((idx, id)) = pick(&features, target) {
                        f.classifiers().delete_feature(id, BoundaryPolicy::Append).expect("delete feature");
                        features.swap_remove(idx);
                        groups.record(1);
                    }
                }
                Action::BeginGroup => {
                    groups.open(rows(&f));
                    f.begin_group();
                }
            }
        }
        groups.drop_empty();

        let final_rows = rows(&f);
        let n = groups.sizes.len();
        let after = |i: usize| if i + 1 < n { groups.bases[i + 1].clone() } else { final_rows.clone() };

        // One group per undo; an immediate redo puts it back.
        for i in (0..n).rev() {
            let undone = step(&mut f, false);
            prop_assert_eq!(undone.total(), groups.sizes[i]);
            prop_assert_eq!(&rows(&f), &groups.bases[i]);

            let redone = step(&mut f, true);
            prop_assert_eq!(redone.total(), groups.sizes[i]);
            prop_assert_eq!(rows(&f), after(i));

            step(&mut f, false);
        }

        let mut stats = Statistics::new();
        let exhausted = f.undo(&mut stats);
        prop_assert!(matches!(exhausted, Err(CtrlError::InvalidRequest(_))));
        prop_assert!(stats.is_empty());
        prop_assert!(rows(&f).is_empty());

        for i in 0..n {
            let redone = step(&mut f, true);
            prop_assert_eq!(redone.total(), groups.sizes[i]);
            prop_assert_eq!(rows(&f), after(i));
        }
        prop_assert_eq!(&rows(&f), &final_rows);
        prop_assert!(!f.journal().can_redo());

        // An edit right after redoing a group that has a successor is undone on its own.
        if n > 1 {
            let k = 1 + pivot % (n - 1);
            for _ in 0..=(n - k) {
                step(&mut f, false);
            }
            step(&mut f, true);
            let before_edit = after(k - 1);
            prop_assert_eq!(&rows(&f), &before_edit);

            f.classifiers()
                .create_classifier(ClassifierRecord::new(ClassifierType::Class, "late"), BoundaryPolicy::Append)
                .expect("late edit");
            let undone = step(&mut f, false);
            prop_assert_eq!(undone.total(), 1);
            prop_assert_eq!(&rows(&f), &before_edit);

            let undone = step(&mut f, false);
            prop_assert_eq!(undone.total(), groups.sizes[k - 1]);
            prop_assert_eq!(&rows(&f), &groups.bases[k - 1]);
        }
    }
}
