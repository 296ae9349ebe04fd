use contingency::{Factor, Table, Value};
use std::error::Error;

/// Prints a joint distribution over three variables as a chain of conditionals,
/// `P(A, B, C) = P(A | B, C) * P(B | C) * P(C)`, then multiplies the chain back together.
fn main() -> Result<(), Box<dyn Error>> {
    let levels: i64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);

    let mut rows = Vec::new();
    for a in 0..levels {
        for b in 0..levels {
            for c in 0..levels {
                rows.push(((a, b, c), (1 + a * 7 + b * 3 + c * 5) as f64));
            }
        }
    }
    let joint = Table::with_names(rows, vec!["A", "B", "C"])?.normalised();

    let a_given_bc = joint.condition_on(&["B", "C"], true)?;
    let bc = joint.marginal(&["A"], true)?;
    let b_given_c = bc.condition_on(&["C"], true)?;
    let c = bc.marginal(&["B"], true)?;

    println!("P(C) = {:?}", c);
    println!("P(B | C) = {:?}", b_given_c);
    println!("P(A | B, C) = {:?}", a_given_bc);

    let chain = Factor::from(b_given_c).product(&Factor::from(c))?;
    let rebuilt = Factor::from(a_given_bc).product(&chain)?;
    let rebuilt = rebuilt
        .into_flat()
        .ok_or("the chain should collapse into a joint table")?;

    let mut worst: f64 = 0.0;
    for (key, p) in joint.iter() {
        let named: Vec<(&str, Value)> = joint
            .named_key(key)
            .into_iter()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        let q = rebuilt.get_by(&[], &named)?;
        worst = worst.max((p - q).abs());
    }
    println!("rebuilt columns: {:?}", rebuilt.names());
    println!("largest difference from the joint: {:e}", worst);
    Ok(())
}
