//! Integration tests for the sharding layer
//!
//! Verifies sharding equivalence against a monolithic trie, the load-balance
//! bound of the planner, parallel loading from a file-backed line source,
//! and snapshot round-trips of a whole index.

use std::collections::HashSet;
use std::io::Write as _;

use shardtrie::{
    DoubleArrayTrie, LineSource, LineSourceConfig, PrefixSearch, ShardPlanner, ShardedIndex,
    SymbolHistogram, Trie,
};

fn records(words: &[String]) -> impl Iterator<Item = shardtrie::Result<String>> + '_ {
    words.iter().map(|w| Ok(w.clone()))
}

fn vocabulary() -> Vec<String> {
    // 10 distinct first symbols, uneven group sizes
    let mut words = Vec::new();
    for (i, c) in ('a'..='j').enumerate() {
        for n in 0..(i + 1) * 3 {
            words.push(format!("{}word{:02}", c, n));
        }
    }
    words
}

#[test]
fn test_balanced_ten_symbol_scenario() {
    // 10 words over 10 distinct first symbols, three shards
    let words: Vec<String> = ('a'..='j').map(|c| format!("{}x", c)).collect();
    let hist = SymbolHistogram::from_words(&words);
    let plan = ShardPlanner::new(3).plan(&hist).unwrap();
    assert_eq!(plan.avg_size(), 4);

    let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
    index.load_parallel(records(&words)).unwrap();

    for w in &words {
        assert!(index.contains(w), "missing {}", w);
    }
    // no shard holds more than the average plus one symbol group
    for size in index.shard_sizes() {
        assert!(size as u64 <= 4 + 1, "overloaded shard: {}", size);
    }
    assert_eq!(index.len(), words.len());
}

#[test]
fn test_sharded_equals_monolithic() {
    let words = vocabulary();
    let hist = SymbolHistogram::from_words(&words);
    let plan = ShardPlanner::new(4).plan(&hist).unwrap();

    let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
    index.load_parallel(records(&words)).unwrap();

    let mut single = DoubleArrayTrie::new();
    for w in &words {
        single.insert(w).unwrap();
    }

    assert_eq!(index.len(), single.len());
    // every vocabulary word and a batch of absent probes agree
    for w in &words {
        assert_eq!(index.contains(w), single.contains(w), "contains {}", w);
    }
    for probe in ["aword99", "zzz", "", "awor", "jword00x"] {
        assert_eq!(index.contains(probe), single.contains(probe), "contains {}", probe);
    }
    for prefix in ["a", "aword0", "j", "zz", ""] {
        let mut a: Vec<String> = index.match_prefix(prefix);
        let mut b: Vec<String> = single.match_prefix(prefix);
        a.sort();
        b.sort();
        assert_eq!(a, b, "match_prefix {:?}", prefix);
    }
    for probe in ["aword01", "jword11suffix", "x"] {
        let a: HashSet<String> = index.prefixes_of(probe).into_iter().collect();
        let b: HashSet<String> = single.prefixes_of(probe).into_iter().collect();
        assert_eq!(a, b, "prefixes_of {:?}", probe);
    }
    assert_eq!(index.sub_words("ajword05x"), single.sub_words("ajword05x"));
}

#[test]
fn test_parallel_load_from_file_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..100 {
        // id<TAB>word<TAB>score, with consecutive duplicate words
        writeln!(file, "{}\tentry{:02}\t{}", i, i / 2, i).unwrap();
    }
    file.flush().unwrap();

    let config = LineSourceConfig {
        delimiter: '\t',
        field: Some(1),
    };

    let planning = LineSource::from_path_with_config(file.path(), config.clone()).unwrap();
    let plan = ShardPlanner::new(2).plan_records(planning).unwrap();

    let loading = LineSource::from_path_with_config(file.path(), config).unwrap();
    let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
    let stats = index.load_parallel(loading).unwrap();

    // 100 lines, consecutive pairs coalesced to 50 distinct entries
    assert_eq!(stats.routed, 50);
    assert_eq!(stats.inserted, 50);
    assert_eq!(stats.read_errors, 0);
    assert_eq!(index.len(), 50);
    for i in 0..50 {
        assert!(index.contains(&format!("entry{:02}", i)));
    }
}

#[test]
fn test_index_snapshot_round_trip() {
    let words = vocabulary();
    let hist = SymbolHistogram::from_words(&words);
    let plan = ShardPlanner::new(3).plan(&hist).unwrap();
    let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
    index.load_parallel(records(&words)).unwrap();

    let bytes = index.to_bytes().unwrap();
    let restored: ShardedIndex = ShardedIndex::from_bytes(&bytes).unwrap();

    assert_eq!(restored.len(), index.len());
    assert_eq!(restored.num_shards(), index.num_shards());
    assert_eq!(restored.shard_sizes(), index.shard_sizes());
    for w in &words {
        assert!(restored.contains(w));
    }
    // routing cursors survive too: further inserts keep working
    let mut restored = restored;
    assert!(restored.insert("aword_new").unwrap());
    assert!(restored.contains("aword_new"));
}

#[test]
fn test_removals_propagate_across_spans() {
    // force a multi-span symbol, then delete from it
    let words: Vec<String> = (0..60).map(|i| format!("a{:02}", i)).collect();
    let hist = SymbolHistogram::from_words(&words);
    let plan = ShardPlanner::new(3).plan(&hist).unwrap();
    assert!(plan.shards_for(b'a' as u16).unwrap().len() >= 2);

    let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
    index.load_parallel(records(&words)).unwrap();

    for w in &words {
        assert!(index.remove(w), "failed to remove {}", w);
    }
    assert_eq!(index.len(), 0);
    for w in &words {
        assert!(!index.contains(w));
    }
}

#[test]
fn test_mixed_load_and_mutation() {
    let words = vocabulary();
    let hist = SymbolHistogram::from_words(&words);
    let plan = ShardPlanner::new(4).plan(&hist).unwrap();
    let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
    index.load_parallel(records(&words)).unwrap();

    // direct mutation after bulk load uses the same routing
    assert!(index.insert("freshly-added").unwrap());
    assert!(index.contains("freshly-added"));
    assert!(!index.insert("freshly-added").unwrap());
    assert!(index.remove("freshly-added"));
    assert_eq!(index.len(), words.len());
}
