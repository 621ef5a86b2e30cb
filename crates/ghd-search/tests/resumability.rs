use ghd_core::SearchError;
use ghd_search::{
    split_combinations, CombinationIterator, Generator, ParentCheck, Predicate, Registries,
    Snapshot, SplitCombinationIterator,
};
use proptest::prelude::*;
use serde::Serialize;

fn drain(generator: &mut dyn Generator) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    while generator.has_next() {
        out.push(generator.get_next().unwrap());
        generator.confirm();
    }
    out
}

fn advance_by(generator: &mut dyn Generator, steps: usize) {
    for _ in 0..steps {
        if !generator.has_next() {
            break;
        }
        generator.get_next().unwrap();
        generator.confirm();
    }
}

proptest! {
    #[test]
    fn restored_combination_continues_identically(n in 0usize..9, k in 0usize..4, steps in 0usize..40) {
        let registries = Registries::standard().unwrap();
        let mut original = CombinationIterator::new(n, k);
        advance_by(&mut original, steps);

        let snapshot = original.snapshot().unwrap();
        let mut restored = registries.generators.restore(&snapshot).unwrap();
        prop_assert_eq!(restored.tag(), CombinationIterator::TAG);
        prop_assert_eq!(drain(restored.as_mut()), drain(&mut original));
    }

    #[test]
    fn restored_split_shard_continues_identically(
        n in 1usize..9,
        k in 1usize..4,
        shards in 1usize..5,
        steps in 0usize..20,
    ) {
        let registries = Registries::standard().unwrap();
        for mut shard in split_combinations(n, k, shards) {
            advance_by(&mut shard, steps);
            let bytes = bincode::serialize(&shard.snapshot().unwrap()).unwrap();
            let snapshot: Snapshot = bincode::deserialize(&bytes).unwrap();
            let mut restored = registries.generators.restore(&snapshot).unwrap();
            prop_assert_eq!(drain(restored.as_mut()), drain(&mut shard));
        }
    }

    #[test]
    fn shards_partition_the_full_sequence(n in 0usize..8, k in 0usize..4, shards in 1usize..6) {
        let full = drain(&mut CombinationIterator::new(n, k));
        let mut union: Vec<Vec<usize>> = split_combinations(n, k, shards)
            .iter_mut()
            .flat_map(|shard| drain(shard))
            .collect();
        prop_assert_eq!(union.len(), full.len());
        union.sort();
        let mut expected = full.clone();
        expected.sort();
        prop_assert_eq!(union, expected);
    }
}

#[test]
fn outstanding_state_survives_the_snapshot() {
    let registries = Registries::standard().unwrap();
    let mut generator = SplitCombinationIterator::new(4, 2, 1, 2);
    assert_eq!(generator.get_next().unwrap(), vec![0, 2]);
    generator.found();

    let mut restored = registries
        .generators
        .restore(&generator.snapshot().unwrap())
        .unwrap();
    // the restored copy still owes a confirm for [0, 2]
    assert!(matches!(restored.get_next(), Err(SearchError::Contract(_))));
    restored.confirm();
    assert_eq!(restored.get_next().unwrap(), vec![1, 2]);
}

#[test]
fn predicate_configuration_roundtrips() {
    let registries = Registries::standard().unwrap();
    let check = ParentCheck::new(vec![1, 2], vec![7]);
    let restored = registries
        .predicates
        .restore(&check.snapshot().unwrap())
        .unwrap();
    assert_eq!(restored.tag(), ParentCheck::TAG);
    assert_eq!(format!("{restored:?}"), format!("{check:?}"));
}

#[test]
fn unregistered_tags_fail_to_decode() {
    let registries = Registries::empty();
    let snapshot = CombinationIterator::new(3, 2).snapshot().unwrap();
    let err = registries.generators.restore(&snapshot).unwrap_err();
    assert!(matches!(err, SearchError::Decode(ref info) if info.code == "unknown-tag"));
    assert!(registries.generators.ensure_registered("combination").is_err());

    let tampered = Snapshot::capture(SplitCombinationIterator::TAG, &vec![1u8, 2, 3]).unwrap();
    let standard = Registries::standard().unwrap();
    let err = standard.generators.restore(&tampered).unwrap_err();
    assert!(matches!(err, SearchError::Decode(ref info) if info.code == "snapshot-decode"));
}

#[test]
fn out_of_range_shards_fail_to_decode() {
    #[derive(Serialize)]
    struct RawSplit {
        shard: usize,
        shards: usize,
        inner: CombinationIterator,
    }

    let registries = Registries::standard().unwrap();
    let forged = RawSplit {
        shard: 3,
        shards: 2,
        inner: CombinationIterator::new(4, 2),
    };
    let snapshot = Snapshot::capture(SplitCombinationIterator::TAG, &forged).unwrap();
    let err = registries.generators.restore(&snapshot).unwrap_err();
    assert!(matches!(err, SearchError::Decode(ref info) if info.code == "invalid-generator-state"));

    let honest = SplitCombinationIterator::new(4, 2, 1, 2).snapshot().unwrap();
    let restored = registries.generators.restore(&honest).unwrap();
    assert_eq!(restored.peek(), Some(&[0, 2][..]));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registries = Registries::standard().unwrap();
    let tags: Vec<&str> = registries.generators.tags().collect();
    assert_eq!(tags, vec!["combination", "split-combination"]);

    fn never(_: &Snapshot) -> Result<Box<dyn Generator>, SearchError> {
        Ok(Box::new(CombinationIterator::new(0, 0)))
    }
    let err = registries
        .generators
        .register(CombinationIterator::TAG, never)
        .unwrap_err();
    assert!(matches!(err, SearchError::Config(ref info) if info.code == "duplicate-tag"));
}
