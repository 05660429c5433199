// End-to-end scenario tests against the pure core (LSDB merge, SPF,
// reconciler diff) — no real sockets, no real `ip`/`ping` invocations.

use std::collections::{HashMap, HashSet};

use routingd::lsa::Lsa;
use routingd::lsdb::Lsdb;
use routingd::reconcile::{diff_routes, RouteOp};
use routingd::spf::compute_routes;

fn ip(i: u8) -> String {
    format!("172.20.{}.3", i)
}

fn subnet(i: u8) -> String {
    format!("172.20.{}.0/24", i)
}

fn lsa(id: &str, subnet: &str, neighbors: &[(&str, &str, f64)]) -> Lsa {
    let mut n = HashMap::new();
    for (name, nip, cost) in neighbors {
        n.insert(name.to_string(), (nip.to_string(), *cost));
    }
    let mut subnets = HashSet::new();
    subnets.insert(subnet.to_string());
    Lsa::new(id.to_string(), 1, n, subnets)
}

#[test]
fn s1_linear_path_converges_through_lsdb_and_spf() {
    let mut db = Lsdb::new();
    db.merge(lsa(&ip(1), &subnet(1), &[("router2", &ip(2), 1.0)]));
    db.merge(lsa(&ip(2), &subnet(2), &[("router1", &ip(1), 1.0), ("router3", &ip(3), 1.0)]));
    db.merge(lsa(&ip(3), &subnet(3), &[("router2", &ip(2), 1.0)]));

    let routes = compute_routes(&db.snapshot(), &ip(1)).expect("spf");
    assert_eq!(routes.get(&subnet(2)), Some(&ip(2)));
    assert_eq!(routes.get(&subnet(3)), Some(&ip(2)));
}

#[test]
fn s3_one_sided_neighbor_yields_no_route_and_no_kernel_changes() {
    let mut db = Lsdb::new();
    db.merge(lsa(&ip(1), &subnet(1), &[("router2", &ip(2), 1.0)]));
    // router2 never originates.

    let routes = compute_routes(&db.snapshot(), &ip(1)).expect("spf");
    assert!(routes.is_empty());

    let ops = diff_routes(&routes, &HashMap::new(), &HashSet::new());
    assert!(ops.is_empty());
}

#[test]
fn s4_sequence_regression_is_discarded_and_does_not_trigger_reflood() {
    let mut db = Lsdb::new();
    let first = Lsa::new(ip(3), 7, HashMap::new(), HashSet::new());
    let regressed = Lsa::new(ip(3), 5, HashMap::new(), HashSet::new());

    assert!(db.merge(first));
    assert!(!db.merge(regressed));
    assert_eq!(db.get(&ip(3)).unwrap().sequence, 7);
}

#[test]
fn s5_link_flap_deletes_stale_route_once_next_hop_goes_inactive() {
    // At T0, R1 has a route to R3's subnet via R2.
    let mut db = Lsdb::new();
    db.merge(lsa(&ip(1), &subnet(1), &[("router2", &ip(2), 1.0)]));
    db.merge(lsa(&ip(2), &subnet(2), &[("router1", &ip(1), 1.0), ("router3", &ip(3), 1.0)]));
    db.merge(lsa(&ip(3), &subnet(3), &[("router2", &ip(2), 1.0)]));

    let computed_before = compute_routes(&db.snapshot(), &ip(1)).expect("spf");
    assert_eq!(computed_before.get(&subnet(3)), Some(&ip(2)));

    let kernel_before: HashMap<String, String> =
        [(subnet(3), ip(2))].into_iter().collect();

    // R2 stops answering pings; R1's own neighbor-active-set filter removes
    // it before the route ever reaches the reconciler.
    let active_neighbors: HashSet<String> = HashSet::new();
    let filtered = routingd::reconcile::filter_by_active_neighbors(computed_before, &active_neighbors);
    assert!(filtered.is_empty());

    let ops = diff_routes(&filtered, &kernel_before, &HashSet::new());
    assert_eq!(ops, vec![RouteOp::Delete { cidr: subnet(3) }]);
}

#[test]
fn s6_convergence_is_independent_of_delivery_order() {
    let mut forward_order = Lsdb::new();
    forward_order.merge(lsa(&ip(1), &subnet(1), &[("router2", &ip(2), 1.0)]));
    forward_order.merge(lsa(&ip(2), &subnet(2), &[("router1", &ip(1), 1.0), ("router3", &ip(3), 1.0)]));
    forward_order.merge(lsa(&ip(3), &subnet(3), &[("router2", &ip(2), 1.0)]));

    let mut reverse_order = Lsdb::new();
    reverse_order.merge(lsa(&ip(3), &subnet(3), &[("router2", &ip(2), 1.0)]));
    reverse_order.merge(lsa(&ip(2), &subnet(2), &[("router1", &ip(1), 1.0), ("router3", &ip(3), 1.0)]));
    reverse_order.merge(lsa(&ip(1), &subnet(1), &[("router2", &ip(2), 1.0)]));

    let a = compute_routes(&forward_order.snapshot(), &ip(1)).expect("spf");
    let b = compute_routes(&reverse_order.snapshot(), &ip(1)).expect("spf");
    assert_eq!(a, b);
}

#[test]
fn successive_recomputes_are_idempotent_on_an_unchanged_lsdb() {
    let mut db = Lsdb::new();
    db.merge(lsa(&ip(1), &subnet(1), &[("router2", &ip(2), 1.0)]));
    db.merge(lsa(&ip(2), &subnet(2), &[("router1", &ip(1), 1.0)]));

    let active: HashSet<String> = [ip(2)].into_iter().collect();

    let routes_first = compute_routes(&db.snapshot(), &ip(1)).expect("spf");
    let filtered_first = routingd::reconcile::filter_by_active_neighbors(routes_first, &active);
    let kernel_after_first: HashMap<String, String> = filtered_first.clone();
    let ops_first = diff_routes(&filtered_first, &HashMap::new(), &HashSet::new());
    assert!(!ops_first.is_empty());

    let routes_second = compute_routes(&db.snapshot(), &ip(1)).expect("spf");
    let filtered_second = routingd::reconcile::filter_by_active_neighbors(routes_second, &active);
    let ops_second = diff_routes(&filtered_second, &kernel_after_first, &HashSet::new());
    assert!(ops_second.is_empty());
}
