//! Crate-wide tuning constants for nearset.
//!
//! Parameter defaults and the fixed algorithmic budgets live here. The
//! per-set runtime parameters are carried by [`crate::NswConfig`]; the
//! constants below are compile-time and deliberately not configurable —
//! they are part of the quality contract the test suite pins.

/// Default maximum number of bidirectional links per node.
///
/// Higher values improve recall but increase memory, build time, and the
/// per-removal healing cost. Typical range: 8–64.
pub const DEFAULT_NEIGHBOURHOOD_SIZE: usize = 16;

/// Default working result-set width (`ef`) during search.
///
/// The result heap holds at least this many candidates regardless of the
/// requested `k`. Higher values improve recall at the cost of latency.
pub const DEFAULT_SEARCH_SET_SIZE: usize = 100;

/// Default cap on best-first expansion steps.
///
/// `-1` leaves the walk bounded only by the visited budget; `0` disables
/// the walk entirely (entry points only, no refinement); positive values
/// set an explicit limit.
pub const DEFAULT_SEARCH_MAX_STEPS: i32 = -1;

/// Default multiplier on [`DEFAULT_SEARCH_SET_SIZE`] for the per-query
/// visited budget.
pub const DEFAULT_ADAPTIVE_STEP_FACTOR: f32 = 1.5;

/// Default entry-point count. `-1` selects `max(3, floor(sqrt(n)))`
/// automatically.
pub const DEFAULT_NUM_ENTRY_POINTS: i32 = -1;

/// Default extra budget multiplier for the insert-time construction search.
pub const DEFAULT_CONSTRUCTION_FACTOR: f32 = 4.0;

/// Default α for RNG-rule edge diversification. Values above 1.0 keep more
/// long-range edges.
pub const DEFAULT_PRUNING_ALPHA: f64 = 1.0;

/// How many already-selected neighbors each pruning candidate is checked
/// against. Checking beyond the closest few selected entries does not
/// measurably change edge quality.
pub const PRUNE_CHECK_LIMIT: usize = 10;

/// Maximum fresh (non-cached) distance computations per pruning call.
/// Once exhausted, an unresolvable check never disqualifies a candidate.
pub const PRUNE_FRESH_DISTANCE_BUDGET: usize = 30;

/// How many of the best results the refinement pass expands.
pub const REFINE_TOP_RESULTS: usize = 3;

/// Shared fresh-distance budget for the refinement pass.
pub const REFINE_DISTANCE_BUDGET: usize = 10;

/// Extra construction candidates requested beyond the neighbourhood size.
/// Widens the pool handed to the pruner for edge diversity.
pub const CONSTRUCTION_EXTRA_CANDIDATES: usize = 3;

/// Floor on the automatically selected entry-point count.
pub const MIN_ENTRY_POINTS: usize = 3;

/// Entry points are capped at `search_limit / ENTRY_POINT_BUDGET_DIVISOR`
/// so seeding never eats the whole visited budget.
pub const ENTRY_POINT_BUDGET_DIVISOR: usize = 6;
