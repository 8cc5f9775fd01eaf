//! Pure condition evaluation.
//!
//! Crossing and channel conditions are edge-triggered: the previous price
//! must be strictly on the other side of the boundary while the current
//! price is at or past it, so a price sitting on a threshold fires once and
//! then stays quiet until it moves away and comes back.

use pricewatch_core::{Condition, MarketSnapshot};

/// Evaluate one alert condition against the previous and current price.
///
/// Returns the trigger message when the condition fires, `None` otherwise.
/// Pure and deterministic; identical inputs always produce identical output.
/// A symbol with no baseline yet (`previous == None`) never fires a crossing
/// or channel condition, and a missing 24h statistic never fires a 24h one.
pub fn evaluate(
    condition: &Condition,
    previous: Option<f64>,
    snapshot: &MarketSnapshot,
) -> Option<String> {
    let current = snapshot.current_price;
    let sym = snapshot.symbol.to_uppercase();

    match *condition {
        Condition::CrossUp { price } => {
            let prev = previous?;
            (prev < price && current >= price).then(|| {
                format!(
                    "{sym} crossed up the {price}$ threshold.\n\
                     Previous price: {prev}$\n\
                     Defined price: {price}$\n\
                     Current price: {current}$"
                )
            })
        }

        Condition::CrossDown { price } => {
            let prev = previous?;
            (prev > price && current <= price).then(|| {
                format!(
                    "{sym} crossed down the {price}$ threshold.\n\
                     Previous price: {prev}$\n\
                     Defined price: {price}$\n\
                     Current price: {current}$"
                )
            })
        }

        Condition::Cross { price } => {
            let prev = previous?;
            let crossed =
                (prev < price && current >= price) || (prev > price && current <= price);
            crossed.then(|| {
                format!(
                    "{sym} crossed the {price}$ threshold.\n\
                     Previous price: {prev}$\n\
                     Defined price: {price}$\n\
                     Current price: {current}$"
                )
            })
        }

        Condition::ExitChannel {
            upper_bound,
            lower_bound,
        } => {
            let prev = previous?;
            let exited = (prev > lower_bound && current <= lower_bound)
                || (prev < upper_bound && current >= upper_bound);
            exited.then(|| {
                format!(
                    "{sym} is exiting the channel between {lower_bound}$ and {upper_bound}$.\n\
                     Previous price: {prev}$\n\
                     Defined bounds: {lower_bound}$ - {upper_bound}$\n\
                     Current price: {current}$"
                )
            })
        }

        Condition::EnterChannel {
            upper_bound,
            lower_bound,
        } => {
            let prev = previous?;
            let entered = (prev < lower_bound && current >= lower_bound)
                || (prev > upper_bound && current <= upper_bound);
            entered.then(|| {
                let mut message = format!(
                    "{sym} is entering the channel between {lower_bound}$ and {upper_bound}$.\n\
                     Previous price: {prev}$\n\
                     Defined bounds: {lower_bound}$ - {upper_bound}$\n\
                     Current price: {current}$"
                );
                // A wide enough move can overshoot the far bound in one pass.
                if current > upper_bound || current < lower_bound {
                    message.push_str(
                        "\nWarning: current price is already outside the channel bounds!",
                    );
                }
                message
            })
        }

        Condition::High24h { price } => {
            let high = snapshot.high_24h?;
            (price < high).then(|| {
                format!(
                    "{sym} 24-hour high of {high}$ exceeds the defined price {price}$.\n\
                     Current price: {current}$"
                )
            })
        }

        Condition::Low24h { price } => {
            let low = snapshot.low_24h?;
            (price > low).then(|| {
                format!(
                    "{sym} 24-hour low of {low}$ is below the defined price {price}$.\n\
                     Current price: {current}$"
                )
            })
        }

        Condition::Change24h { price } => {
            let change = snapshot.price_change_24h?;
            (price > change).then(|| {
                format!(
                    "{sym} 24-hour price change of {change}$ is below the defined price {price}$.\n\
                     Current price: {current}$"
                )
            })
        }
    }
}
