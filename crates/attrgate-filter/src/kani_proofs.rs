//! Kani proofs for the three-valued combinators
//!
//! Run with: `cargo kani --harness verify_*`

#[cfg(kani)]
use crate::tristate::Tristate;
#[cfg(kani)]
use std::convert::Infallible;

#[cfg(kani)]
fn any_tristate() -> Tristate {
    match kani::any::<u8>() % 3 {
        0 => Tristate::True,
        1 => Tristate::False,
        _ => Tristate::Fail,
    }
}

/// **Property**: negation is an involution, including on `Fail`
#[cfg(kani)]
#[kani::proof]
fn verify_double_negation() {
    let value = any_tristate();
    assert_eq!(value.negate().negate(), value);
    if value == Tristate::Fail {
        assert_eq!(value.negate(), Tristate::Fail);
    }
}

/// **Property**: a two-child AND returns the first non-True verdict
///
/// **Verification**:
/// - Enumerate every pair of verdicts
/// - True only if both are True; otherwise the left one decides if it is
///   not True
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_conjunction_first_decides() {
    let (a, b) = (any_tristate(), any_tristate());
    let result = Tristate::conjunction([Ok::<_, Infallible>(a), Ok(b)]).unwrap_or(Tristate::Fail);

    if a != Tristate::True {
        assert_eq!(result, a);
    } else {
        assert_eq!(result, b);
    }
}

/// **Property**: OR is True iff a child is True; otherwise Fail iff a child failed
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_disjunction_table() {
    let (a, b) = (any_tristate(), any_tristate());
    let result = Tristate::disjunction([Ok::<_, Infallible>(a), Ok(b)]).unwrap_or(Tristate::Fail);

    let any_true = a == Tristate::True || b == Tristate::True;
    let any_fail = a == Tristate::Fail || b == Tristate::Fail;
    assert_eq!(result == Tristate::True, any_true);
    if !any_true {
        assert_eq!(result == Tristate::Fail, any_fail);
    }
}
