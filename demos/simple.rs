//! A handful of small relational queries exercising the core goal
//! calculus plus the CLP(FD) bridge.
use vulcan_core::combinator::{Conde, Conj, Disj};
use vulcan_core::goal::{eq, fresh};
use vulcan_core::relation_fd::{all_different_fd, in_fd};
use vulcan_core::run::run;
use vulcan_core::term::Term;

fn main() {
    env_logger::init();

    let direct = run(5, |q| Disj::new(eq(q.clone(), Term::int(1)), eq(q, Term::int(2))));
    println!("direct disjunction: {:?}", direct);

    let nested = run(10, |q| {
        fresh(move |x| {
            Conde::new(vec![
                Conj::new(eq(x.clone(), Term::int(1)), eq(q.clone(), x.clone())),
                Conj::new(eq(x.clone(), Term::int(2)), eq(q.clone(), x)),
            ])
        })
    });
    println!("fresh + conde: {:?}", nested);

    let fd = run(10, |q| {
        fresh(move |y| {
            Conj::new(
                Conj::new(in_fd(q.clone(), 3, vec![1, 2, 3]), in_fd(y.clone(), 3, vec![1, 2, 3])),
                Conj::new(all_different_fd(vec![q, y.clone()]), eq(y, Term::int(2))),
            )
        })
    });
    println!("CLP(FD) all_different: {:?}", fd);
}
