use glam::Vec2;
use gridstep::*;
use log::info;

fn main() -> Result<(), PhysicsError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut world = PhysicsWorld::new(WorldConfig {
        cell_size: 100.0,
        columns: 20,
        rows: 10,
        gravity: 15,
        enable_events: true,
        enable_timing: true,
        ..Default::default()
    })?;

    let player = world
        .insert(
            EntityDesc::new(
                BoundingBox::new(120.0, 300.0, 40.0, 60.0),
                PhysicsState::dynamic(10).with_jump(90),
            )
            .tagged(EntityTag::Player),
        )?;
    let floor = world
        .insert(EntityDesc::new(BoundingBox::new(0.0, 0.0, 2000.0, 40.0), PhysicsState::fixed()))?;
    let coin = world
        .insert(EntityDesc::new(
            BoundingBox::new(400.0, 40.0, 20.0, 20.0),
            PhysicsState::fixed().with_mask(CollisionMask::Sensor),
        ))?;
    println!("Inserted player={:?} floor={:?} coin={:?}", player, floor, coin);

    let queue = world.change_queue();
    world
        .on_collision(coin, move |ev| {
            info!("coin picked up by {:?}", ev.other);
            queue.despawn(ev.entity);
        })?;
    world.set_anchor(Some(player))?;

    for frame in 0..60 {
        world.push_action(player, Action::Go(Direction::Right))?;
        if frame == 30 {
            world.push_action(player, Action::Jump)?;
        }
        world.resolve_tick(1.0 / 60.0);

        let bbox = world.bbox(player)?;
        let grounded = world.is_on_ground(player)?;
        println!(
            "frame {:2}: player at ({:.0}, {:.0}) grounded={}",
            frame, bbox.x, bbox.y, grounded
        );

        for ev in world.drain_events() {
            if let PhysicsEvent::Collision(c) = ev {
                if c.entity == player && c.other != floor {
                    println!(
                        "  collision: {:?} vs {:?} side={:?} solid={}",
                        c.entity, c.other, c.side, c.solid
                    );
                }
            }
        }
    }

    let s = world.stats();
    println!(
        "stats: resolved={} skipped={} probes={} moves={} collisions={} iterations={}",
        s.entities_resolved, s.entities_skipped, s.probes, s.moves, s.collisions, s.iterations
    );
    if let Some(t) = world.timing() {
        println!(
            "timing: tick={:.3}ms resolve={:.3}ms flush={:.3}ms active={:.3}ms",
            t.tick_ms, t.resolve_ms, t.flush_ms, t.active_region_ms
        );
    }
    let g = world.grid_stats();
    println!(
        "grid: cells={} occupied={} memberships={} max_pop={}",
        g.cells, g.occupied_cells, g.memberships, g.max_cell_population
    );
    println!("coin still present: {}", world.contains(coin));
    Ok(())
}
