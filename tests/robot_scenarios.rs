use ai_rover::config::{RobotConfig, SensorConfig};
use ai_rover::evolution::select_champion;
use ai_rover::{Arena, Controls, Fitness, Obstacle, Point, Population, Robot, SimConfig};

fn manual_robot(x: f64, y: f64) -> Robot {
    Robot::new(Point::new(x, y), &RobotConfig::default(), &SensorConfig::default(), None)
}

#[test]
fn ten_ticks_of_throttle_from_the_start_line() {
    let envelope = RobotConfig {
        accel: 0.2,
        friction: 0.05,
        max_vel: 3.0,
        ..RobotConfig::default()
    };
    let arena = Arena::new(1280.0, 720.0);
    let mut robot = Robot::new(Point::new(50.0, 600.0), &envelope, &SensorConfig::default(), None);

    for _ in 0..10 {
        robot.update(&arena, &[], Controls::FORWARD);
    }

    // net gain of accel - friction per tick: v_k = 0.15 k, distance = 0.15 * 55
    assert!(!robot.is_damaged());
    assert_eq!(robot.x, 50.0);
    assert!((robot.y - 591.75).abs() < 1e-9, "y = {}", robot.y);
    assert!((robot.vel - 1.5).abs() < 1e-9);
    assert_eq!(robot.angle, 0.0);
}

#[test]
fn same_inputs_same_trajectory() {
    let arena = Arena::new(1280.0, 720.0);
    let script = [
        Controls::FORWARD,
        Controls { forward: true, left: true, ..Controls::default() },
        Controls { forward: true, right: true, ..Controls::default() },
        Controls { reverse: true, ..Controls::default() },
    ];
    let mut a = manual_robot(640.0, 360.0);
    let mut b = manual_robot(640.0, 360.0);
    for i in 0..200 {
        let input = script[(i / 25) % script.len()];
        a.update(&arena, &[], input);
        b.update(&arena, &[], input);
    }
    assert_eq!((a.x, a.y, a.angle, a.vel), (b.x, b.y, b.angle, b.vel));
}

#[test]
fn wrecked_robot_keeps_sensing_but_never_moves() {
    let arena = Arena::new(400.0, 400.0);
    let wall = Obstacle::new(
        vec![
            Point::new(150.0, 140.0),
            Point::new(250.0, 140.0),
            Point::new(250.0, 150.0),
            Point::new(150.0, 150.0),
        ],
        true,
    )
    .expect("wall");
    let obstacles = vec![wall];
    let mut robot = manual_robot(200.0, 200.0);

    let mut ticks = 0;
    while !robot.is_damaged() && ticks < 500 {
        robot.update(&arena, &obstacles, Controls::FORWARD);
        ticks += 1;
    }
    assert!(robot.is_damaged(), "robot never reached the wall");

    let frozen = (robot.x, robot.y, robot.angle, robot.vel);
    for _ in 0..30 {
        robot.update(&arena, &obstacles, Controls { reverse: true, right: true, ..Controls::default() });
    }
    assert_eq!((robot.x, robot.y, robot.angle, robot.vel), frozen);

    // the straight-ahead ray still sees the wall right in front
    let ahead = robot.sensor().readings()[3].expect("wall ahead");
    assert!(ahead.offset < 0.2);
}

#[test]
fn champion_is_the_robot_on_the_target() {
    let config = SimConfig::default();
    let robots = vec![manual_robot(0.0, 0.0), manual_robot(3.0, 4.0), manual_robot(10.0, 10.0)];
    let champion = select_champion(&robots, Fitness::ClosestToTarget, config.start, Point::new(0.0, 0.0))
        .expect("champion");
    assert_eq!(champion.index, 0);
    assert_eq!(champion.displacement, 0.0);

    // the same answer through a population tick, robots parked by zero input
    let mut population = Population::from_robots(robots, &config);
    let arena = Arena::new(100.0, 100.0);
    let champion = population
        .tick(&arena, &[], Point::new(10.0, 10.0), Controls::default())
        .expect("champion");
    assert_eq!(champion.index, 2);
}

#[test]
fn bundled_map_loads_and_start_is_clear() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("maps/map1.json");
    let obstacles = ai_rover::arena::load_map(&path).expect("map1");
    assert_eq!(obstacles.len(), 5);

    let config = SimConfig::default();
    let arena = Arena::new(config.arena_width, config.arena_height);
    let mut robot = manual_robot(config.start.x, config.start.y);
    robot.update(&arena, &obstacles, Controls::default());
    assert!(!robot.is_damaged());
}
