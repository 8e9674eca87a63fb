//! N-Queens via the FD solver directly: one variable per column holding
//! the row it occupies, `AllDifferent` over the rows and over the two
//! diagonal offsets.
use std::sync::Arc;
use vulcan_core::context::Context;
use vulcan_core::fd::constraints::{AllDifferent, PlusFd};
use vulcan_core::fd::domain::Domain;
use vulcan_core::fd::model::Model;
use vulcan_core::fd::var::FdVar;

fn main() {
    env_logger::init();
    let n: i64 = 8;

    let mut model = Model::new();
    let queens: Vec<FdVar> = (0..n).map(|_| model.new_var(Domain::full(n))).collect();
    model.post(Arc::new(AllDifferent::new(queens.clone())));

    // Diagonals: queen[i] + i and queen[i] - i (shifted by n to stay
    // positive) must each be all-different.
    let mut up = Vec::with_capacity(n as usize);
    let mut down = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        let offset_up = model.new_var(Domain::from_values(2 * n, &[i as i64 + 1]));
        let sum_up = model.new_var(Domain::full(2 * n));
        model.post(Arc::new(PlusFd {
            x: queens[i],
            y: offset_up,
            z: sum_up,
        }));
        up.push(sum_up);

        let offset_down = model.new_var(Domain::from_values(2 * n, &[n - i as i64]));
        let sum_down = model.new_var(Domain::full(2 * n));
        model.post(Arc::new(PlusFd {
            x: queens[i],
            y: offset_down,
            z: sum_down,
        }));
        down.push(sum_down);
    }
    model.post(Arc::new(AllDifferent::new(up)));
    model.post(Arc::new(AllDifferent::new(down)));

    let ctx = Context::new();
    let solutions = model.solve(&ctx, 1).expect("search should not error");
    match solutions.first() {
        Some(solution) => {
            for &q in &queens {
                print!("{} ", solution[&q]);
            }
            println!();
        }
        None => println!("no solution"),
    }
}
