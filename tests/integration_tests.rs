use partitionmap::{Error, PartitionMap, PartitionMapBuilder};

fn text_map() -> PartitionMap<String, i32> {
    PartitionMapBuilder::new()
        .shard_count(64)
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_put_get_round_trip() {
    let map = text_map();

    map.put("key1".to_string(), 1);
    assert_eq!(map.get("key1"), Some(1));
    assert!(map.contains_key("key1"));

    // Overwrite
    map.put("key1".to_string(), 2);
    assert_eq!(map.get("key1"), Some(2));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_delete_is_idempotent() {
    let map = text_map();

    map.put("key1".to_string(), 1).put("key2".to_string(), 2);
    map.delete("key1");
    let after_once = map.to_string();

    map.delete("key1");
    assert_eq!(map.to_string(), after_once);
    assert_eq!(map.get("key1"), None);
    assert_eq!(map.len(), 1);

    // Never-seen key routed to an empty slot
    map.delete("never-seen");
    assert_eq!(map.len(), 1);
}

#[test]
fn test_scenario_put_delete_clear() {
    let map = text_map();

    map.put("a".to_string(), 1);
    map.put("b".to_string(), 2);
    map.put("a".to_string(), 3);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("a"), Some(3));
    assert_eq!(map.keys(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(map.values(), vec![3, 2]);

    map.delete("b");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("b"), None);
    assert_eq!(map.get_or_default("b", 0), 0);
    assert_eq!(map.keys(), vec!["a".to_string()]);

    map.clear();
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.keys(), Vec::<String>::new());
    assert_eq!(map.to_string(), "");
}

#[test]
fn test_len_matches_keys() {
    let map = PartitionMap::with_shard_count(8).unwrap();

    for i in 0..200u64 {
        map.put(i, i * 10);
    }
    for i in (0..200u64).step_by(3) {
        map.delete(&i);
    }

    let keys = map.keys();
    assert_eq!(map.len(), keys.len());
    assert_eq!(map.len(), 200 - (0..200).step_by(3).count());
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_display_lines_follow_key_order() {
    let map = text_map();
    for (i, key) in ["pear", "apple", "fig", "kiwi", "banana"].iter().enumerate() {
        map.put(key.to_string(), i as i32);
    }

    let rendered = map.to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    let keys: Vec<String> = lines
        .iter()
        .map(|line| line.split(": ").next().unwrap().to_string())
        .collect();

    assert_eq!(keys, map.keys());
    assert!(rendered.ends_with('\n'));
    assert!(lines.contains(&"apple: 1"));
}

#[test]
fn test_for_each_visits_every_entry() {
    let map = text_map();
    for i in 0..50 {
        map.put(format!("key_{}", i), i);
    }

    let mut seen = Vec::new();
    map.for_each(|k, v| seen.push((k.clone(), *v)));
    seen.sort();

    assert_eq!(seen.len(), 50);
    assert_eq!(seen[0], ("key_0".to_string(), 0));
}

#[test]
fn test_for_each_can_write_back() {
    let map = text_map();
    map.put("a".to_string(), 1).put("b".to_string(), 2);

    // Re-entering the map from the visitor must not deadlock
    map.for_each(|k, v| {
        map.put(k.clone(), v * 100);
    });

    assert_eq!(map.values(), vec![100, 200]);
}

#[test]
fn test_iter_snapshot() {
    let map = text_map();

    map.put("key1".to_string(), 1);
    map.put("key2".to_string(), 2);
    map.put("key3".to_string(), 3);

    let mut entries: Vec<_> = map.iter_snapshot().collect();
    entries.sort();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0, "key1");
    assert_eq!(entries[1].0, "key2");
    assert_eq!(entries[2].0, "key3");
}

#[test]
fn test_partition_stats() {
    let map = PartitionMap::with_shard_count(64).unwrap();
    assert_eq!(map.partition_stats().parts, 0);
    assert_eq!(map.partition_stats().avg, 0);

    // 1 and 65 share slot 1; 2 lands in slot 2
    map.put(1u64, "a").put(65u64, "b").put(2u64, "c");

    let stats = map.partition_stats();
    assert_eq!(stats.parts, 2);
    assert_eq!(stats.keys, 3);
    assert_eq!(stats.avg, 1);
    assert_eq!(stats.part_keys.get(&1), Some(&2));
    assert_eq!(stats.part_keys.get(&2), Some(&1));
    assert_eq!(stats.part_keys.len(), 2);
}

#[test]
fn test_operations_cover_allocated_slots() {
    let map = PartitionMap::with_shard_count(16).unwrap();
    map.put(3u32, 1).put(5u32, 2);
    map.get(&3u32);

    let ops = map.operations();
    assert_eq!(ops.keys().copied().collect::<Vec<_>>(), vec![3, 5]);

    #[cfg(feature = "metrics")]
    {
        assert_eq!(ops[&3].writes, 1);
        assert_eq!(ops[&3].reads, 1);
    }
}

#[test]
fn test_builder_invalid_shard_count() {
    assert_eq!(
        PartitionMapBuilder::new().shard_count(0).err(),
        Some(Error::InvalidShardCount)
    );
    assert!(PartitionMap::<u64, u64>::with_shard_count(0).is_err());

    // Any positive count is accepted
    assert!(PartitionMapBuilder::new().shard_count(100).is_ok());
}

#[test]
fn test_integer_keys_route_by_modulo() {
    let map: PartitionMap<i64, i64> = PartitionMap::with_shard_count(128).unwrap();
    assert_eq!(map.slot_index(&5), 5);
    assert_eq!(map.slot_index(&300), 300 % 128);
}

#[test]
fn test_visits_follow_slot_order() {
    let map: PartitionMap<u64, u64> = PartitionMap::with_shard_count(8).unwrap();
    map.put(7, 70).put(2, 20).put(5, 50);

    let mut visited = Vec::new();
    map.for_each(|k, _| visited.push(*k));
    assert_eq!(visited, vec![2, 5, 7]);

    let iterated: Vec<u64> = map.iter_snapshot().map(|(k, _)| k).collect();
    assert_eq!(iterated, vec![2, 5, 7]);
}

#[test]
fn test_wide_integer_keys() {
    let map: PartitionMap<u128, &str> = PartitionMap::with_shard_count(16).unwrap();
    let big = u64::MAX as u128 + 3;
    map.put(big, "big").put(3, "small");

    assert_eq!(map.slot_index(&big), (big % 16) as usize);
    assert_eq!(map.get(&big), Some("big"));
    assert_eq!(map.keys(), vec![3, big]);
}
