use arbor_db_types::{
    traits::CheckpointDatabase,
    types::{CheckpointManifest, CheckpointWithManifest},
};
use arbor_primitives::{BlockId, Buf32};
use arbor_test_utils::{chain::test_block_id, ArbitraryGenerator};

fn entry_with(values: Vec<Buf32>, machines: Vec<Buf32>) -> CheckpointWithManifest {
    let contents: Vec<u8> = ArbitraryGenerator::new().generate();
    CheckpointWithManifest::new(contents, CheckpointManifest::new(values, machines))
}

pub fn test_put_get_block(db: &impl CheckpointDatabase) {
    let entry: CheckpointWithManifest = ArbitraryGenerator::new().generate();
    let id = test_block_id(10, 0);

    db.put_block(id, entry.clone()).expect("test: put");
    let stored = db
        .get_block(id)
        .expect("test: get")
        .expect("test: get missing");
    assert_eq!(stored, entry);
}

pub fn test_get_missing_block(db: &impl CheckpointDatabase) {
    db.put_block(test_block_id(10, 0), entry_with(vec![], vec![]))
        .expect("test: put");

    assert!(db.get_block(test_block_id(10, 1)).expect("test: get").is_none());
    assert!(db.get_block(test_block_id(11, 0)).expect("test: get").is_none());
}

pub fn test_put_block_overwrites(db: &impl CheckpointDatabase) {
    let id = test_block_id(4, 0);
    let first = entry_with(vec![], vec![]);
    let second = entry_with(vec![Buf32::new([1; 32])], vec![]);

    db.put_block(id, first).expect("test: put first");
    db.put_block(id, second.clone()).expect("test: put second");

    assert_eq!(db.get_block(id).expect("test: get"), Some(second));
    assert_eq!(db.block_ids_at_height(4).expect("test: ids"), vec![id]);
}

pub fn test_delete_block(db: &impl CheckpointDatabase) {
    let id = test_block_id(7, 0);
    db.put_block(id, entry_with(vec![], vec![])).expect("test: put");

    assert!(db.delete_block(id).expect("test: delete"));
    assert!(db.get_block(id).expect("test: get").is_none());
    assert!(!db.delete_block(id).expect("test: delete again"));
    assert!(db.is_block_store_empty().expect("test: empty"));
}

pub fn test_block_ids_at_height(db: &impl CheckpointDatabase) {
    let forks: Vec<BlockId> = (0..3).map(|fork| test_block_id(20, fork)).collect();
    for id in &forks {
        db.put_block(*id, entry_with(vec![], vec![])).expect("test: put");
    }
    db.put_block(test_block_id(19, 9), entry_with(vec![], vec![]))
        .expect("test: put below");
    db.put_block(test_block_id(21, 9), entry_with(vec![], vec![]))
        .expect("test: put above");

    let mut expected = forks.clone();
    expected.sort();
    assert_eq!(db.block_ids_at_height(20).expect("test: ids"), expected);
    assert!(db.block_ids_at_height(22).expect("test: ids").is_empty());
}

pub fn test_min_max_heights(db: &impl CheckpointDatabase) {
    assert!(db.is_block_store_empty().expect("test: empty"));
    assert_eq!(db.min_block_height().expect("test: min"), None);
    assert_eq!(db.max_block_height().expect("test: max"), None);

    // Heights past one byte make sure keys sort numerically.
    for height in [300, 5, 42, 256] {
        db.put_block(test_block_id(height, 0), entry_with(vec![], vec![]))
            .expect("test: put");
    }

    assert!(!db.is_block_store_empty().expect("test: empty"));
    assert_eq!(db.min_block_height().expect("test: min"), Some(5));
    assert_eq!(db.max_block_height().expect("test: max"), Some(300));

    db.delete_block(test_block_id(300, 0)).expect("test: delete");
    assert_eq!(db.max_block_height().expect("test: max"), Some(256));
}

pub fn test_value_refcount(db: &impl CheckpointDatabase) {
    let hash = Buf32::new([9; 32]);
    let data = b"shared value".to_vec();

    db.put_value(hash, data.clone()).expect("test: put");
    db.put_value(hash, data.clone()).expect("test: put again");

    db.delete_value(hash).expect("test: delete");
    assert_eq!(db.get_value(hash).expect("test: get"), Some(data));

    db.delete_value(hash).expect("test: delete last");
    assert_eq!(db.get_value(hash).expect("test: get"), None);
}

pub fn test_machine_refcount(db: &impl CheckpointDatabase) {
    let hash = Buf32::new([8; 32]);
    let data = b"machine".to_vec();

    db.put_machine(hash, data.clone()).expect("test: put");
    db.put_machine(hash, data.clone()).expect("test: put again");
    db.put_machine(hash, data.clone()).expect("test: put third");

    for _ in 0..2 {
        db.delete_machine(hash).expect("test: delete");
        assert_eq!(db.get_machine(hash).expect("test: get"), Some(data.clone()));
    }
    db.delete_machine(hash).expect("test: delete last");
    assert_eq!(db.get_machine(hash).expect("test: get"), None);
}

pub fn test_delete_missing_object(db: &impl CheckpointDatabase) {
    let hash = Buf32::new([1; 32]);
    db.delete_value(hash).expect("test: delete value");
    db.delete_machine(hash).expect("test: delete machine");

    // A stray delete must not leave a negative count behind.
    db.put_value(hash, vec![1]).expect("test: put");
    assert_eq!(db.get_value(hash).expect("test: get"), Some(vec![1]));
    db.delete_value(hash).expect("test: delete");
    assert_eq!(db.get_value(hash).expect("test: get"), None);
}

pub fn test_values_and_machines_are_separate(db: &impl CheckpointDatabase) {
    let hash = Buf32::new([5; 32]);
    db.put_value(hash, b"value".to_vec()).expect("test: put value");

    assert_eq!(db.get_machine(hash).expect("test: get machine"), None);

    db.put_machine(hash, b"machine".to_vec())
        .expect("test: put machine");
    db.delete_value(hash).expect("test: delete value");

    assert_eq!(db.get_value(hash).expect("test: get value"), None);
    assert_eq!(
        db.get_machine(hash).expect("test: get machine"),
        Some(b"machine".to_vec())
    );
}

#[macro_export]
macro_rules! checkpoint_db_tests {
    ($setup_expr:expr) => {
        #[test]
        fn test_put_get_block() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_put_get_block(&db);
        }

        #[test]
        fn test_get_missing_block() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_get_missing_block(&db);
        }

        #[test]
        fn test_put_block_overwrites() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_put_block_overwrites(&db);
        }

        #[test]
        fn test_delete_block() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_delete_block(&db);
        }

        #[test]
        fn test_block_ids_at_height() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_block_ids_at_height(&db);
        }

        #[test]
        fn test_min_max_heights() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_min_max_heights(&db);
        }

        #[test]
        fn test_value_refcount() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_value_refcount(&db);
        }

        #[test]
        fn test_machine_refcount() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_machine_refcount(&db);
        }

        #[test]
        fn test_delete_missing_object() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_delete_missing_object(&db);
        }

        #[test]
        fn test_values_and_machines_are_separate() {
            let db = $setup_expr;
            $crate::checkpoint_tests::test_values_and_machines_are_separate(&db);
        }
    };
}
