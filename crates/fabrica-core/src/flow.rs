//! One micro-step of throttled flow for one machine entry.
//!
//! A tick is subdivided into [`STEPS_PER_TICK`] micro-steps so multi-stage
//! chains can settle within a single tick: extractors and their downstream
//! consumers run in the same loop, and later stages bootstrap from earlier
//! stages' transient output.
//!
//! Throttling is proportional, never failing: the scarcest input and the
//! tightest output ceiling pick one shared power fraction in [0, 1], and
//! every flow of the recept scales by it. All `count` units of an entry run
//! in lockstep at that fraction rather than being simulated independently.

use crate::catalog::{Catalog, ReceptDef};
use crate::deposit::Zone;
use crate::error::ContractViolation;
use crate::fixed::Fixed64;
use crate::ledger::Ledger;
use crate::machine::Machine;

/// Micro-steps per tick. Rates are per tick, so each micro-step moves
/// `rate × count / STEPS_PER_TICK` at full power.
pub const STEPS_PER_TICK: u32 = 100;

// ---------------------------------------------------------------------------
// Power primitives
// ---------------------------------------------------------------------------

/// The fraction of a demand actually honored: 1 when `have` covers `need`
/// (or nothing is needed), otherwise `have / need` clamped to [0, 1].
pub fn power(have: Fixed64, need: Fixed64) -> Fixed64 {
    let zero = Fixed64::from_num(0);
    let one = Fixed64::from_num(1);
    if need <= zero || have >= need {
        one
    } else if have <= zero {
        zero
    } else {
        have / need
    }
}

/// The shared logistics throttle applied during reconciliation: 1 when
/// nothing mobile moved (or moved net-negative) or the fleet covers the
/// whole flow, else the covered fraction.
pub fn reconciliation_factor(drones: Fixed64, sum: Fixed64) -> Fixed64 {
    let zero = Fixed64::from_num(0);
    if sum <= zero || drones >= sum {
        Fixed64::from_num(1)
    } else if drones <= zero {
        zero
    } else {
        drones / sum
    }
}

/// The scarcest input throttles the whole recept. 1 if there are no inputs.
fn power_in(
    recept: &ReceptDef,
    ledger: &Ledger,
    consume_factor: Fixed64,
) -> Result<Fixed64, ContractViolation> {
    let mut p = Fixed64::from_num(1);
    for part in &recept.inputs {
        let container = ledger
            .get(part.resource)
            .ok_or(ContractViolation::UnknownResource(part.resource))?;
        p = p.min(power(container.count, part.rate * consume_factor));
    }
    Ok(p)
}

/// The tightest output ceiling throttles the whole recept. 1 if there are
/// no outputs.
fn power_out(
    recept: &ReceptDef,
    ledger: &Ledger,
    consume_factor: Fixed64,
) -> Result<Fixed64, ContractViolation> {
    let mut p = Fixed64::from_num(1);
    for part in &recept.outputs {
        let container = ledger
            .get(part.resource)
            .ok_or(ContractViolation::UnknownResource(part.resource))?;
        p = p.min(power(container.headroom(), part.rate * consume_factor));
    }
    Ok(p)
}

/// Whether any configured output container is at or over its ceiling. A
/// full warehouse hard-stalls the machine: zero flow, not a trickle.
fn any_output_full(recept: &ReceptDef, ledger: &Ledger) -> Result<bool, ContractViolation> {
    for part in &recept.outputs {
        let container = ledger
            .get(part.resource)
            .ok_or(ContractViolation::UnknownResource(part.resource))?;
        if container.is_full() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Apply one micro-step of flow: consume inputs and produce outputs scaled
/// by `consume_factor × power`.
fn apply(
    recept: &ReceptDef,
    ledger: &mut Ledger,
    consume_factor: Fixed64,
    power: Fixed64,
) -> Result<(), ContractViolation> {
    for part in &recept.inputs {
        let container = ledger
            .get_mut(part.resource)
            .ok_or(ContractViolation::UnknownResource(part.resource))?;
        container.count -= part.rate * consume_factor * power;
    }
    for part in &recept.outputs {
        let container = ledger
            .get_mut(part.resource)
            .ok_or(ContractViolation::UnknownResource(part.resource))?;
        container.count += part.rate * consume_factor * power;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Production machines
// ---------------------------------------------------------------------------

/// One micro-step for a production machine entry against the ledger.
///
/// No-op when idle, empty, or hard-stalled by a full output container.
pub fn production_step(
    machine: &Machine,
    catalog: &Catalog,
    ledger: &mut Ledger,
) -> Result<(), ContractViolation> {
    let Some(recept_id) = machine.key.recept else {
        return Ok(());
    };
    if machine.count == 0 {
        return Ok(());
    }
    let recept = catalog
        .recept(recept_id)
        .ok_or(ContractViolation::UnknownRecept(recept_id))?;
    if any_output_full(recept, ledger)? {
        return Ok(());
    }

    let consume_factor = Fixed64::from_num(machine.count) / Fixed64::from_num(STEPS_PER_TICK);
    let p = power_in(recept, ledger, consume_factor)?.min(power_out(
        recept,
        ledger,
        consume_factor,
    )?);
    apply(recept, ledger, consume_factor, p)
}

// ---------------------------------------------------------------------------
// Miner machines
// ---------------------------------------------------------------------------

/// One micro-step for a miner entry against the ledger and its zone.
///
/// Active units are capped by the deposit's slot capacity — a hard cap from
/// slot scarcity, distinct from proportional throttling. The deposit's
/// remaining stock plays the input role, the output container's headroom
/// the output role, and the deposit's current performance scales the rate.
pub fn miner_step(
    machine: &Machine,
    catalog: &Catalog,
    ledger: &mut Ledger,
    zone: &mut Zone,
) -> Result<(), ContractViolation> {
    let Some(recept_id) = machine.key.recept else {
        return Ok(());
    };
    if machine.count == 0 {
        return Ok(());
    }
    let recept = catalog
        .recept(recept_id)
        .ok_or(ContractViolation::UnknownRecept(recept_id))?;
    // Miner recepts carry exactly one output (validated at catalog build);
    // anything else idles the entry.
    let [part] = recept.outputs.as_slice() else {
        return Ok(());
    };
    let part = *part;

    let output = ledger
        .get(part.resource)
        .ok_or(ContractViolation::UnknownResource(part.resource))?;
    if output.is_full() {
        return Ok(());
    }
    let headroom = output.headroom();

    // No matching deposit in this zone: the machine sits idle.
    let Some(deposit) = zone.deposit_mut(part.resource) else {
        return Ok(());
    };
    let active = machine.count.min(deposit.slots());
    if active == 0 {
        return Ok(());
    }
    deposit.claim_slots(active);

    let consume_factor = Fixed64::from_num(active) * deposit.performance()
        / Fixed64::from_num(STEPS_PER_TICK);
    let need = part.rate * consume_factor;
    let p = power(deposit.count, need).min(power(headroom, need));
    let moved = need * p;

    deposit.count -= moved;
    ledger
        .get_mut(part.resource)
        .ok_or(ContractViolation::UnknownResource(part.resource))?
        .count += moved;
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, MachineKind, ReceptPart, ResourceFormat};
    use crate::deposit::Deposit;
    use crate::fixed::fixed64_to_f64;
    use crate::id::{MachineKey, MachineTypeId, ReceptId, ResourceTypeId};

    const ORE: ResourceTypeId = ResourceTypeId(0);
    const PLATE: ResourceTypeId = ResourceTypeId(1);
    const MINE: ReceptId = ReceptId(0);
    const MELT: ReceptId = ReceptId(1);
    const MINER: MachineTypeId = MachineTypeId(0);
    const SMELTER: MachineTypeId = MachineTypeId(1);

    fn fx(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn close(a: Fixed64, b: f64) -> bool {
        (fixed64_to_f64(a) - b).abs() < 1e-6
    }

    /// iron_ore --mine--> stock --melt (3:1)--> iron_plate
    fn test_catalog() -> Catalog {
        let mut b = CatalogBuilder::new();
        let ore = b.register_resource("iron_ore", ResourceFormat::Particulate);
        let plate = b.register_resource("iron_plate", ResourceFormat::Plate);
        let drone = b.register_resource("drone", ResourceFormat::Unit);
        b.set_logistics(drone);
        let mine = b.register_recept(
            "mine_iron_ore",
            vec![],
            vec![ReceptPart {
                resource: ore,
                rate: fx(1.0),
            }],
        );
        let melt = b.register_recept(
            "melt_iron_ore",
            vec![ReceptPart {
                resource: ore,
                rate: fx(3.0),
            }],
            vec![ReceptPart {
                resource: plate,
                rate: fx(1.0),
            }],
        );
        b.register_machine("miner", MachineKind::Miner, vec![mine], vec![], fx(1.0), fx(1.0));
        b.register_machine(
            "smelter",
            MachineKind::Production,
            vec![melt],
            vec![],
            fx(1.0),
            fx(1.0),
        );
        b.build().unwrap()
    }

    fn ledger(catalog: &Catalog) -> Ledger {
        Ledger::seeded(catalog, fx(0.0), fx(5000.0))
    }

    fn machine(key: MachineKey, count: u32) -> Machine {
        Machine { key, count }
    }

    // -----------------------------------------------------------------------
    // Power primitives
    // -----------------------------------------------------------------------

    #[test]
    fn power_saturates_at_one() {
        assert_eq!(power(fx(5.0), fx(3.0)), fx(1.0));
        assert_eq!(power(fx(3.0), fx(3.0)), fx(1.0));
    }

    #[test]
    fn power_is_proportional_when_scarce() {
        assert!(close(power(fx(1.0), fx(4.0)), 0.25));
    }

    #[test]
    fn power_of_nonpositive_need_is_full() {
        assert_eq!(power(fx(0.0), fx(0.0)), fx(1.0));
        assert_eq!(power(fx(-1.0), fx(0.0)), fx(1.0));
    }

    #[test]
    fn power_of_nonpositive_have_is_zero() {
        assert_eq!(power(fx(0.0), fx(2.0)), fx(0.0));
        assert_eq!(power(fx(-3.0), fx(2.0)), fx(0.0));
    }

    // -----------------------------------------------------------------------
    // Production steps
    // -----------------------------------------------------------------------

    #[test]
    fn idle_entry_is_noop() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(100.0);
        let before = l.clone();

        let m = machine(MachineKey::idle(SMELTER), 5);
        production_step(&m, &catalog, &mut l).unwrap();
        assert_eq!(l, before);
    }

    #[test]
    fn zero_count_entry_is_noop() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(100.0);
        let before = l.clone();

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 0);
        production_step(&m, &catalog, &mut l).unwrap();
        assert_eq!(l, before);
    }

    #[test]
    fn full_output_hard_stalls() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(100.0);
        let plate = l.get_mut(PLATE).unwrap();
        plate.count = fx(10.0);
        plate.max_count = fx(10.0);
        let before = l.clone();

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 1);
        production_step(&m, &catalog, &mut l).unwrap();
        // Zero flow, not a trickle: inputs untouched too.
        assert_eq!(l, before);
    }

    #[test]
    fn full_power_step_moves_one_step_share() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(100.0);

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 1);
        production_step(&m, &catalog, &mut l).unwrap();

        // One unit over 100 micro-steps: 3/100 ore in, 1/100 plate out.
        assert!(close(l.get(ORE).unwrap().count, 100.0 - 0.03));
        assert!(close(l.get(PLATE).unwrap().count, 0.01));
    }

    #[test]
    fn scarce_input_throttles_proportionally() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        // Need 0.03 per step, have 0.015: power = 1/2.
        l.get_mut(ORE).unwrap().count = fx(0.015);

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 1);
        production_step(&m, &catalog, &mut l).unwrap();

        assert!(close(l.get(ORE).unwrap().count, 0.0));
        assert!(close(l.get(PLATE).unwrap().count, 0.005));
    }

    #[test]
    fn tight_output_ceiling_throttles_both_sides() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(100.0);
        // Headroom 0.005 against 0.01 need: power = 1/2.
        l.get_mut(PLATE).unwrap().max_count = fx(0.005);

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 1);
        production_step(&m, &catalog, &mut l).unwrap();

        assert!(close(l.get(ORE).unwrap().count, 100.0 - 0.015));
        assert!(close(l.get(PLATE).unwrap().count, 0.005));
    }

    #[test]
    fn units_scale_flow_linearly() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(100.0);

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 10);
        production_step(&m, &catalog, &mut l).unwrap();
        assert!(close(l.get(PLATE).unwrap().count, 0.1));
    }

    #[test]
    fn consumption_never_overdraws() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        l.get_mut(ORE).unwrap().count = fx(0.001);

        let m = machine(MachineKey::new(SMELTER, Some(MELT)), 50);
        for _ in 0..STEPS_PER_TICK {
            production_step(&m, &catalog, &mut l).unwrap();
        }
        assert!(l.get(ORE).unwrap().count >= fx(0.0));
    }

    // -----------------------------------------------------------------------
    // Miner steps
    // -----------------------------------------------------------------------

    fn ore_zone(count: f64, performance: f64, slots: u32) -> Zone {
        Zone::new([Deposit::new(ORE, fx(count), fx(performance), slots)])
    }

    #[test]
    fn miner_full_tick_yields_rate_times_performance() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        // Deposit large enough that within-tick depletion cannot shift the
        // yield at this tolerance.
        let mut zone = ore_zone(1e9, 1.0, 3);

        let m = machine(MachineKey::new(MINER, Some(MINE)), 1);
        for _ in 0..STEPS_PER_TICK {
            miner_step(&m, &catalog, &mut l, &mut zone).unwrap();
        }
        // 100 steps × rate(1) × 1/100 × power(1) = 1.
        assert!(close(l.get(ORE).unwrap().count, 1.0));
        assert!(close(zone.deposit(ORE).unwrap().count, 1e9 - 1.0));
        assert_eq!(zone.deposit(ORE).unwrap().used_slots(), 1);
    }

    #[test]
    fn miner_units_capped_by_slots() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        let mut zone = ore_zone(10000.0, 1.0, 3);

        // 5 units but only 3 slots: 2 idle this tick.
        let m = machine(MachineKey::new(MINER, Some(MINE)), 5);
        miner_step(&m, &catalog, &mut l, &mut zone).unwrap();
        assert_eq!(zone.deposit(ORE).unwrap().used_slots(), 3);
        assert!(close(l.get(ORE).unwrap().count, 0.03));
    }

    #[test]
    fn miner_noop_without_deposit() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        let mut zone = Zone::default();
        let before = l.clone();

        let m = machine(MachineKey::new(MINER, Some(MINE)), 2);
        miner_step(&m, &catalog, &mut l, &mut zone).unwrap();
        assert_eq!(l, before);
    }

    #[test]
    fn miner_noop_when_output_full() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        let ore = l.get_mut(ORE).unwrap();
        ore.count = fx(5.0);
        ore.max_count = fx(5.0);
        let mut zone = ore_zone(10000.0, 1.0, 3);

        let m = machine(MachineKey::new(MINER, Some(MINE)), 1);
        miner_step(&m, &catalog, &mut l, &mut zone).unwrap();
        assert_eq!(l.get(ORE).unwrap().count, fx(5.0));
        assert_eq!(zone.deposit(ORE).unwrap().used_slots(), 0);
        assert_eq!(zone.deposit(ORE).unwrap().count, fx(10000.0));
    }

    #[test]
    fn miner_drains_deposit_to_zero_not_below() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        let mut zone = ore_zone(0.004, 1.0, 3);

        let m = machine(MachineKey::new(MINER, Some(MINE)), 3);
        for _ in 0..STEPS_PER_TICK {
            miner_step(&m, &catalog, &mut l, &mut zone).unwrap();
        }
        let remaining = zone.deposit(ORE).unwrap().count;
        assert!(remaining >= fx(0.0));
        assert!(close(l.get(ORE).unwrap().count + remaining, 0.004));
    }

    #[test]
    fn miner_performance_scales_yield() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        let mut zone = ore_zone(10000.0, 0.7, 3);

        let m = machine(MachineKey::new(MINER, Some(MINE)), 1);
        miner_step(&m, &catalog, &mut l, &mut zone).unwrap();
        assert!(close(l.get(ORE).unwrap().count, 0.007));
    }

    #[test]
    fn later_claims_overwrite_earlier_ones() {
        let catalog = test_catalog();
        let mut l = ledger(&catalog);
        let mut zone = ore_zone(10000.0, 1.0, 3);

        let big = machine(MachineKey::new(MINER, Some(MINE)), 3);
        let small = machine(MachineKey::new(MINER, Some(MINE)), 1);
        miner_step(&big, &catalog, &mut l, &mut zone).unwrap();
        assert_eq!(zone.deposit(ORE).unwrap().used_slots(), 3);
        miner_step(&small, &catalog, &mut l, &mut zone).unwrap();
        // Overwrite semantics: last writer wins.
        assert_eq!(zone.deposit(ORE).unwrap().used_slots(), 1);
    }

    // -----------------------------------------------------------------------
    // Property tests
    // -----------------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn power_is_always_a_fraction(have in -1000.0..1000.0f64, need in -1000.0..1000.0f64) {
                let p = power(fx(have), fx(need));
                prop_assert!(p >= fx(0.0));
                prop_assert!(p <= fx(1.0));
            }

            #[test]
            fn power_never_overdraws(have in 0.0..1000.0f64, need in 0.001..1000.0f64) {
                let p = power(fx(have), fx(need));
                prop_assert!(p * fx(need) <= fx(have) || p == fx(1.0) && fx(have) >= fx(need));
            }

            #[test]
            fn used_slots_never_exceed_slots(units in 0u32..100, slots in 0u32..10) {
                let mut d = Deposit::new(ORE, fx(100.0), fx(1.0), slots);
                d.claim_slots(units);
                prop_assert!(d.used_slots() <= d.slots());
            }

            #[test]
            fn reconciliation_factor_is_a_fraction(
                drones in -100.0..100000.0f64,
                sum in -100.0..100000.0f64,
            ) {
                let f = reconciliation_factor(fx(drones), fx(sum));
                prop_assert!(f >= fx(0.0));
                prop_assert!(f <= fx(1.0));
            }

            #[test]
            fn reconciled_flow_never_exceeds_fleet(
                drones in 0.0..100000.0f64,
                sum in 0.001..100000.0f64,
            ) {
                let f = reconciliation_factor(fx(drones), fx(sum));
                // Either the fleet covers everything, or the carried share
                // fits within it.
                prop_assert!(fx(drones) >= fx(sum) || f * fx(sum) <= fx(drones));
            }
        }
    }
}
