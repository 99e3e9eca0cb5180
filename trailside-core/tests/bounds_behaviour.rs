#![expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]

//! Behavioural tests for bounds validation and containment.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use trailside_core::{Bounds, BoundsError};

#[derive(Debug, Default)]
struct BoundsWorld {
    outer: RefCell<Option<Bounds>>,
    contained: RefCell<Option<bool>>,
    parsed: RefCell<Option<Result<Bounds, BoundsError>>>,
}

#[fixture]
fn world() -> BoundsWorld {
    BoundsWorld::default()
}

fn parse(text: &str) -> Result<Bounds, BoundsError> {
    text.trim_matches('"').parse()
}

#[given("the outer bounds {text}")]
fn given_outer(world: &BoundsWorld, text: String) {
    world
        .outer
        .replace(Some(parse(&text).expect("valid outer bounds")));
}

#[when("I check whether {text} is contained")]
fn when_check(world: &BoundsWorld, text: String) {
    let inner = parse(&text).expect("valid inner bounds");
    let outer = world.outer.borrow().expect("outer bounds set");
    world.contained.replace(Some(outer.contains_bounds(&inner)));
}

#[when("I parse the bounds {text}")]
fn when_parse(world: &BoundsWorld, text: String) {
    world.parsed.replace(Some(parse(&text)));
}

#[then("containment is accepted")]
fn then_accepted(world: &BoundsWorld) {
    assert_eq!(*world.contained.borrow(), Some(true));
}

#[then("containment is rejected")]
fn then_rejected(world: &BoundsWorld) {
    assert_eq!(*world.contained.borrow(), Some(false));
}

#[then("a bounds error is reported")]
fn then_error(world: &BoundsWorld) {
    let parsed = world.parsed.borrow();
    assert!(
        matches!(*parsed, Some(Err(BoundsError::Inverted { .. }))),
        "expected inverted latitude error, got {parsed:?}"
    );
}

#[scenario(path = "tests/features/bounds.feature", index = 0)]
fn north_overflow_is_not_contained(world: BoundsWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/bounds.feature", index = 1)]
fn nested_bounds_are_contained(world: BoundsWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/bounds.feature", index = 2)]
fn antimeridian_bounds_contain_both_sides(world: BoundsWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/bounds.feature", index = 3)]
fn inverted_latitudes_are_rejected(world: BoundsWorld) {
    let _ = world;
}
