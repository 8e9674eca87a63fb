//! 9x9 Sudoku via the FD solver: one variable per cell in `1..=9`,
//! `AllDifferent` over every row, column, and 3x3 box.
use std::sync::Arc;
use vulcan_core::context::Context;
use vulcan_core::fd::constraints::AllDifferent;
use vulcan_core::fd::domain::Domain;
use vulcan_core::fd::model::Model;
use vulcan_core::fd::var::FdVar;

const SIZE: usize = 9;
const BOX: usize = 3;

#[rustfmt::skip]
const BOARD: [i64; SIZE * SIZE] = [
    0, 0, 0, 2, 6, 0, 7, 0, 1,
    6, 8, 0, 0, 7, 0, 0, 9, 0,
    1, 9, 0, 0, 0, 4, 5, 0, 0,
    8, 2, 0, 1, 0, 0, 0, 4, 0,
    0, 0, 4, 6, 0, 2, 9, 0, 0,
    0, 5, 0, 0, 0, 3, 0, 2, 8,
    0, 0, 9, 3, 0, 0, 0, 7, 4,
    0, 4, 0, 0, 5, 0, 0, 3, 6,
    7, 0, 3, 0, 1, 8, 0, 0, 0,
];

fn main() {
    env_logger::init();
    let mut model = Model::new();
    let cells: Vec<FdVar> = BOARD
        .iter()
        .map(|&given| {
            if given == 0 {
                model.new_var(Domain::full(SIZE as i64))
            } else {
                model.new_var(Domain::from_values(SIZE as i64, &[given]))
            }
        })
        .collect();

    for row in 0..SIZE {
        let vars: Vec<FdVar> = (0..SIZE).map(|col| cells[row * SIZE + col]).collect();
        model.post(Arc::new(AllDifferent::new(vars)));
    }
    for col in 0..SIZE {
        let vars: Vec<FdVar> = (0..SIZE).map(|row| cells[row * SIZE + col]).collect();
        model.post(Arc::new(AllDifferent::new(vars)));
    }
    for box_row in 0..SIZE / BOX {
        for box_col in 0..SIZE / BOX {
            let mut vars = Vec::with_capacity(BOX * BOX);
            for r in 0..BOX {
                for c in 0..BOX {
                    let row = box_row * BOX + r;
                    let col = box_col * BOX + c;
                    vars.push(cells[row * SIZE + col]);
                }
            }
            model.post(Arc::new(AllDifferent::new(vars)));
        }
    }

    let ctx = Context::new();
    let solutions = model.solve(&ctx, 1).expect("search should not error");
    match solutions.first() {
        Some(solution) => {
            for row in 0..SIZE {
                for col in 0..SIZE {
                    print!("{} ", solution[&cells[row * SIZE + col]]);
                }
                println!();
            }
        }
        None => println!("no solution"),
    }
}
