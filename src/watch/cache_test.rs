use super::*;
use crate::test_utils::active_gateway;
use crate::test_utils::key;
use crate::CacheError;

#[test]
fn get_by_key_should_fail_until_synced() {
    let cache = ObjectCache::new();
    cache.upsert(active_gateway("gw-a", &[]));

    assert_eq!(cache.get_by_key(&key("gw-a")), Err(CacheError::NotSynced));

    cache.mark_synced();
    assert!(cache.has_synced());
    assert_eq!(cache.get_by_key(&key("gw-a")).unwrap(), Some(active_gateway("gw-a", &[])));
}

#[test]
fn get_by_key_should_return_none_for_unknown_object() {
    let cache = ObjectCache::new();
    cache.mark_synced();

    assert_eq!(cache.get_by_key(&key("missing")), Ok(None));
}

#[test]
fn upsert_should_return_previous_version() {
    let cache = ObjectCache::new();
    let v1 = active_gateway("gw-a", &[("connected", "east")]);
    let v2 = active_gateway("gw-a", &[("connected", "west")]);

    assert!(cache.upsert(v1.clone()).is_none());
    assert_eq!(cache.upsert(v2.clone()), Some(v1));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.list(), vec![v2]);
}

#[test]
fn remove_should_return_last_cached_version() {
    let cache = ObjectCache::new();
    let obj = active_gateway("gw-a", &[]);
    cache.upsert(obj.clone());

    assert_eq!(cache.remove(&key("gw-a")), Some(obj));
    assert_eq!(cache.remove(&key("gw-a")), None);
    assert!(cache.is_empty());
}
