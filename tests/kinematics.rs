//! Whole-mouse kinematics scenarios for a two-wheel differential drive.

use mousesim::context::SimParams;
use mousesim::maze::{Direction, Maze};
use mousesim::maze_file::parse_num;
use mousesim::mouse::Mouse;
use mousesim::mouse_file::MouseDescription;
use uom::si::angular_velocity::radian_per_second;
use uom::si::f64::{AngularVelocity, Time};
use uom::si::length::meter;
use uom::si::time::second;

const WHEEL_RADIUS: f64 = 0.015;
const HALF_TRACK: f64 = 0.035;

fn params() -> SimParams {
    SimParams::builder().build()
}

fn maze() -> Maze {
    parse_num("0 0 1 1 1 1\n").unwrap()
}

fn differential_mouse() -> Mouse {
    let description =
        MouseDescription::from_str(include_str!("../mice/differential.toml")).unwrap();
    Mouse::from_description(&description, Direction::East, &params())
}

fn set_speeds(mouse: &mut Mouse, left: f64, right: f64) {
    mouse
        .wheel_mut("left")
        .unwrap()
        .set_angular_velocity(AngularVelocity::new::<radian_per_second>(left));
    mouse
        .wheel_mut("right")
        .unwrap()
        .set_angular_velocity(AngularVelocity::new::<radian_per_second>(right));
}

#[test]
fn test_in_place_turn() {
    let mut mouse = differential_mouse();
    let maze = maze();
    let params = params();
    let omega = 10.0;
    set_speeds(&mut mouse, omega, -omega);

    let start = mouse.current_translation();
    let dt = Time::new::<second>(0.001);
    for _ in 0..500 {
        mouse.update(dt, &maze, &params);
    }

    // Opposite wheel speeds cancel in translation and add up in rotation;
    // spinning the left wheel forward turns the mouse clockwise.
    assert!(mouse.current_translation().approx_eq(&start));
    let expected_rotation = -omega * WHEEL_RADIUS * 0.5 / HALF_TRACK;
    approx::assert_relative_eq!(
        mouse.current_rotation().value,
        expected_rotation,
        epsilon = 1e-9
    );
    approx::assert_relative_eq!(
        mouse.read_gyro().get::<radian_per_second>(),
        -omega * WHEEL_RADIUS / HALF_TRACK,
        epsilon = 1e-9
    );
}

#[test]
fn test_straight_line() {
    let mut mouse = differential_mouse();
    let maze = maze();
    let params = params();
    let omega = 10.0;
    set_speeds(&mut mouse, omega, omega);

    let start = mouse.current_translation();
    let dt = Time::new::<second>(0.001);
    for _ in 0..500 {
        mouse.update(dt, &maze, &params);
    }

    assert!(mousesim::units::angles_equal(
        mouse.current_rotation(),
        mouse.initial_rotation()
    ));
    approx::assert_relative_eq!(
        (mouse.current_translation().x - start.x).get::<meter>(),
        omega * WHEEL_RADIUS * 0.5,
        epsilon = 1e-9
    );
    approx::assert_relative_eq!(
        (mouse.current_translation().y - start.y).get::<meter>(),
        0.0,
        epsilon = 1e-9
    );
    approx::assert_relative_eq!(mouse.elapsed_sim_time().get::<second>(), 0.5, epsilon = 1e-9);
}

#[test]
fn test_curve_turn_traces_quarter_arc() {
    let mut mouse = differential_mouse();
    let maze = maze();
    let params = params();
    mouse.set_wheel_speeds_for_curve_turn_left(1.0);

    let start = mouse.current_translation();
    let dt = Time::new::<second>(0.0001);
    let quarter = std::f64::consts::FRAC_PI_2;
    let mut ticks = 0;
    while mouse.current_rotation().value < quarter {
        mouse.update(dt, &maze, &params);
        ticks += 1;
        assert!(ticks < 1_000_000, "curve turn never completed");
    }

    // The arc radius is half a wall length, so the endpoint sits one radius
    // forward and one radius to the left.
    let radius = 0.168 / 2.0;
    assert!((mouse.current_rotation().value - quarter).abs() < 1e-3);
    assert!(
        ((mouse.current_translation().x - start.x).get::<meter>() - radius).abs() < 1e-3
    );
    assert!(
        ((mouse.current_translation().y - start.y).get::<meter>() - radius).abs() < 1e-3
    );
}

#[test]
fn test_pose_trajectory_is_deterministic() {
    let run = || {
        let mut mouse = differential_mouse();
        let maze = maze();
        let params = params();
        let dt = Time::new::<second>(0.001);
        mouse.set_wheel_speeds_for_curve_turn_right(0.7);
        for _ in 0..300 {
            mouse.update(dt, &maze, &params);
        }
        mouse.set_wheel_speeds_for_move_forward(0.4);
        for _ in 0..300 {
            mouse.update(dt, &maze, &params);
        }
        (
            mouse.current_translation().x.value,
            mouse.current_translation().y.value,
            mouse.current_rotation().value,
        )
    };

    // Bit-exact reproducibility, not approximate equality.
    assert_eq!(run(), run());
}

#[test]
fn test_encoders_track_wheel_rotation() {
    let mut mouse = differential_mouse();
    let maze = maze();
    let params = params();
    set_speeds(&mut mouse, 5.0, 5.0);

    let dt = Time::new::<second>(0.001);
    let mut previous = mouse.wheel("left").unwrap().read_relative_encoder();
    for _ in 0..200 {
        mouse.update(dt, &maze, &params);
        let current = mouse.wheel("left").unwrap().read_relative_encoder();
        assert!(current >= previous);
        previous = current;
    }
    // 5 rad/s for 0.2 s is 1 radian of accumulated rotation.
    let expected_ticks = (1.0 / std::f64::consts::TAU * 360.0) as i32;
    assert!((previous - expected_ticks).abs() <= 1);
}

#[test]
fn test_sensors_refresh_during_update() {
    let mut mouse = differential_mouse();
    let maze = maze();
    let params = params();

    mouse.update(Time::new::<second>(0.001), &maze, &params);
    // Front sensor sits 0.05 m ahead of the center, 0.04 m from the east
    // wall of the closed 1x1 maze, well within its 0.12 m range.
    let reading = mouse.sensor("front").unwrap().read();
    approx::assert_relative_eq!(reading, 1.0 - 0.04 / 0.12, epsilon = 1e-9);
}
