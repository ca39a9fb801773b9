extern crate fdm_wave;

use fdm_wave::{compute_reality_factor, run, Config, InitialCondition, RealityInputs};

fn main() {
    let dt = 0.5;
    let dx = 1.;

    println!("reality factor: {:?}", compute_reality_factor(2., 3., 5.));

    let config = Config::new(5, dx, dt, 4, InitialCondition::Values(vec![0., 1., 0., 0., 0.]))
        .with_reality(RealityInputs::new(1., 1., 1.));

    match run(&config) {
        Ok(history) => {
            for (i, grid) in history.iter().enumerate() {
                println!("{}: {:?}", i, grid.as_slice());
            }
        }
        Err(e) => println!("{}", e),
    }
}
