use renova_resolver::{
    canonical_file_name, resolve, CandidateTemplates, ImageReference, ImageResolver,
    ResolutionCache, ResolutionStore, Transition, CANDIDATE_COUNT,
};
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn test_cache_hit_jumps_to_proxy() {
    let store = Arc::new(ResolutionCache::new());
    store.record_if_absent("a.jpg", "/api/images/a.jpg");
    let resolver = ImageResolver::new(CandidateTemplates::default(), store);

    let image = resolver.begin("a.jpg").unwrap();
    assert_eq!(image.index(), 1);
    assert_eq!(image.current(), "/api/images/a.jpg");
}

#[test]
fn test_sequential_failures() {
    let templates = CandidateTemplates::new()
        .with_proxy_prefix("/y")
        .with_remotes("/z", "/w");
    let resolver = ImageResolver::isolated(templates);
    let mut image = resolver.begin("x.jpg").unwrap();

    let seen: Vec<String> = std::iter::once(image.current().to_string())
        .chain((0..4).map(|_| {
            resolver.fail(&mut image);
            image.current().to_string()
        }))
        .collect();
    assert_eq!(seen, ["x.jpg", "/y/x.jpg", "/z/x.jpg", "/w/x.jpg", "/placeholder.jpg"]);

    assert_eq!(resolver.fail(&mut image), Transition::Exhausted);
    assert_eq!(image.current(), "/placeholder.jpg");
}

#[test]
fn test_independent_resolvers_do_not_share() {
    let a = ImageResolver::default();
    let b = ImageResolver::default();
    let mut image = a.begin("solo.jpg").unwrap();
    a.fail(&mut image);
    a.complete(&mut image);

    assert_eq!(b.begin("solo.jpg").unwrap().index(), 0);
}

proptest! {
    #[test]
    fn prop_candidate_list_shape(raw in "[a-zA-Z0-9_./:?=-]{1,40}") {
        let reference = ImageReference::new(raw.clone()).unwrap();
        let list = resolve(&reference, &CandidateTemplates::default());

        prop_assert_eq!(list.len(), CANDIDATE_COUNT);
        prop_assert_eq!(list.last(), "/placeholder.jpg");
        prop_assert_eq!(list.get(0), Some(raw.as_str()));
    }

    #[test]
    fn prop_query_never_in_file_name(
        dirs in proptest::collection::vec("[a-z0-9]{1,8}", 0..4),
        name in "[a-z0-9]{1,12}\\.(jpg|png|webp)",
        query in "[a-z0-9=&/]{0,16}",
    ) {
        let mut path = dirs.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&name);
        let raw = format!("{path}?{query}");
        prop_assert_eq!(canonical_file_name(&raw), name.as_str());
    }

    #[test]
    fn prop_bare_name_unchanged(name in "[a-zA-Z0-9_.-]{1,24}") {
        prop_assert_eq!(canonical_file_name(&name), name.as_str());
    }

    #[test]
    fn prop_failures_only_move_forward(failures in 0usize..12) {
        let resolver = ImageResolver::default();
        let mut image = resolver.begin("p.jpg").unwrap();
        let mut last = image.index();
        for _ in 0..failures {
            match resolver.fail(&mut image) {
                Transition::Advanced { from, to } => {
                    prop_assert_eq!(from, last);
                    prop_assert_eq!(to, last + 1);
                }
                Transition::Exhausted => prop_assert_eq!(last, CANDIDATE_COUNT - 1),
                Transition::Ignored => prop_assert!(false, "not loaded yet"),
            }
            last = image.index();
        }
        prop_assert_eq!(image.index(), failures.min(CANDIDATE_COUNT - 1));
    }

    #[test]
    fn prop_first_writer_wins(key in "[a-z]{1,6}", first in "[a-z/]{1,10}", second in "[a-z/]{1,10}") {
        let cache = ResolutionCache::new();
        cache.record_if_absent(&key, &first);
        cache.record_if_absent(&key, &second);
        prop_assert_eq!(cache.lookup(&key), Some(first));
    }
}
