//! Minimal kinematics for the falling letters, the ship and its bullets.
//!
//! Bodies move on straight lines and overlaps are reported as [`Contact`]s; nothing
//! here resolves collisions. Coordinates are y-up with the floor at `y = 0`.

use std::collections::HashSet;

pub const OBSTACLE_SIZE: f64 = 50.0;
pub const SHIP_WIDTH: f64 = 60.0;
pub const SHIP_HEIGHT: f64 = 70.0;
pub const SHIP_Y: f64 = 100.0;
pub const BULLET_RADIUS: f64 = 5.0;
pub const BULLET_SPEED: f64 = 400.0;
pub const FLOOR_HEIGHT: f64 = 10.0;
/// Letters spawn this far above the top edge
pub const SPAWN_OFFSET: f64 = 40.0;
/// Letters fall `height + FALL_EXTRA` in total
pub const FALL_EXTRA: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BulletId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub letter: char,
    pub x: f64,
    pub y: f64,
    start_y: f64,
    fall_distance: f64,
    duration: f64,
    elapsed: f64,
}

impl Obstacle {
    /// Fraction of the fall already covered, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    fn rect(&self) -> Rect {
        Rect::centered(self.x, self.y, OBSTACLE_SIZE, OBSTACLE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub id: BulletId,
    pub x: f64,
    pub y: f64,
}

impl Bullet {
    fn rect(&self) -> Rect {
        Rect::centered(self.x, self.y, BULLET_RADIUS * 2.0, BULLET_RADIUS * 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipPose {
    Idle,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ship {
    pub x: f64,
    pub y: f64,
    pub pose: ShipPose,
}

impl Ship {
    fn rect(&self) -> Rect {
        Rect::centered(self.x, self.y, SHIP_WIDTH, SHIP_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Shot(BulletId),
    Ship,
    Floor,
    /// The fall animation ran to its end; the obstacle is already gone
    FallComplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub kind: ContactKind,
    pub obstacle: ObstacleId,
    pub letter: char,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Rect {
    fn centered(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            min_x: x - w / 2.0,
            min_y: y - h / 2.0,
            max_x: x + w / 2.0,
            max_y: y + h / 2.0,
        }
    }

    fn intersects(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Touch {
    Ship(ObstacleId),
    Floor(ObstacleId),
}

#[derive(Debug)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
    pub ship: Ship,
    obstacles: Vec<Obstacle>,
    bullets: Vec<Bullet>,
    touching: HashSet<Touch>,
    next_id: u64,
}

impl Playfield {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ship: Ship {
                x: width / 2.0,
                y: SHIP_Y,
                pose: ShipPose::Idle,
            },
            obstacles: Vec::new(),
            bullets: Vec::new(),
            touching: HashSet::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn has_obstacles(&self) -> bool {
        !self.obstacles.is_empty()
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    /// Drop a letter at the top edge; it covers `height + FALL_EXTRA` in `duration` seconds.
    pub fn spawn_obstacle(&mut self, letter: char, x: f64, duration: f64) -> ObstacleId {
        let id = ObstacleId(self.next_id());
        let start_y = self.height + SPAWN_OFFSET;
        self.obstacles.push(Obstacle {
            id,
            letter,
            x,
            y: start_y,
            start_y,
            fall_distance: self.height + FALL_EXTRA,
            duration,
            elapsed: 0.0,
        });
        id
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let pos = self.obstacles.iter().position(|o| o.id == id)?;
        self.touching
            .retain(|t| !matches!(t, Touch::Ship(o) | Touch::Floor(o) if *o == id));
        Some(self.obstacles.remove(pos))
    }

    pub fn fire_bullet(&mut self) -> BulletId {
        let id = BulletId(self.next_id());
        self.bullets.push(Bullet {
            id,
            x: self.ship.x,
            y: self.ship.y + SHIP_HEIGHT / 2.0 + 10.0,
        });
        id
    }

    pub fn remove_bullet(&mut self, id: BulletId) -> bool {
        let before = self.bullets.len();
        self.bullets.retain(|b| b.id != id);
        before != self.bullets.len()
    }

    /// Slide the ship horizontally, keeping it fully on screen
    pub fn move_ship(&mut self, dx: f64) {
        let half = SHIP_WIDTH / 2.0;
        self.ship.x = (self.ship.x + dx).max(half).min(self.width - half);
        self.ship.pose = if dx > 0.0 {
            ShipPose::Right
        } else if dx < 0.0 {
            ShipPose::Left
        } else {
            ShipPose::Idle
        };
    }

    pub fn settle_ship(&mut self) {
        self.ship.pose = ShipPose::Idle;
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.bullets.clear();
        self.touching.clear();
    }

    /// Advance every body by `dt` seconds and report the contacts that began.
    pub fn step(&mut self, dt: f64) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for obstacle in &mut self.obstacles {
            obstacle.elapsed += dt;
            obstacle.y = obstacle.start_y - obstacle.fall_distance * obstacle.progress();
        }

        let ceiling = self.height + OBSTACLE_SIZE;
        for bullet in &mut self.bullets {
            bullet.y += BULLET_SPEED * dt;
        }
        self.bullets.retain(|b| b.y - BULLET_RADIUS <= ceiling);

        for bullet in &self.bullets {
            let bullet_rect = bullet.rect();
            if let Some(hit) = self
                .obstacles
                .iter()
                .find(|o| o.rect().intersects(&bullet_rect))
            {
                contacts.push(contact(ContactKind::Shot(bullet.id), hit));
            }
        }

        let ship_rect = self.ship.rect();
        let floor_rect = Rect::centered(self.width / 2.0, 0.0, self.width, FLOOR_HEIGHT);
        let mut touching = HashSet::new();
        for obstacle in &self.obstacles {
            let rect = obstacle.rect();
            if rect.intersects(&ship_rect) {
                touching.insert(Touch::Ship(obstacle.id));
                if !self.touching.contains(&Touch::Ship(obstacle.id)) {
                    contacts.push(contact(ContactKind::Ship, obstacle));
                }
            }
            if rect.intersects(&floor_rect) {
                touching.insert(Touch::Floor(obstacle.id));
                if !self.touching.contains(&Touch::Floor(obstacle.id)) {
                    contacts.push(contact(ContactKind::Floor, obstacle));
                }
            }
        }
        self.touching = touching;

        let finished: Vec<Obstacle> = self
            .obstacles
            .iter()
            .filter(|o| o.progress() >= 1.0)
            .cloned()
            .collect();
        for obstacle in finished {
            contacts.push(contact(ContactKind::FallComplete, &obstacle));
            self.remove_obstacle(obstacle.id);
        }

        contacts
    }
}

fn contact(kind: ContactKind, obstacle: &Obstacle) -> Contact {
    Contact {
        kind,
        obstacle: obstacle.id,
        letter: obstacle.letter,
        x: obstacle.x,
        y: obstacle.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(contacts: &[Contact]) -> Vec<ContactKind> {
        contacts.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_obstacle_falls_linearly() {
        let mut field = Playfield::new(400.0, 800.0);
        let id = field.spawn_obstacle('A', 100.0, 8.0);

        assert_eq!(field.obstacle(id).unwrap().y, 840.0);
        field.step(4.0);
        let o = field.obstacle(id).unwrap();
        assert_eq!(o.progress(), 0.5);
        assert_eq!(o.y, 840.0 - 440.0);
    }

    #[test]
    fn test_fall_complete_removes_obstacle() {
        let mut field = Playfield::new(400.0, 800.0);
        field.spawn_obstacle('Q', 10.0, 1.0);

        let contacts = field.step(1.5);
        assert!(kinds(&contacts).contains(&ContactKind::FallComplete));
        assert!(!field.has_obstacles());
    }

    #[test]
    fn test_floor_contact_reported_once() {
        let mut field = Playfield::new(400.0, 800.0);
        // x far from the ship so only the floor is touched
        let id = field.spawn_obstacle('F', 10.0, 10.0);
        // reach y = 20 (bottom edge at -5)
        let to_floor = (840.0 - 20.0) / 880.0 * 10.0;

        let first = field.step(to_floor);
        assert_eq!(kinds(&first), vec![ContactKind::Floor]);
        assert_eq!(first[0].obstacle, id);

        let second = field.step(0.01);
        assert!(second.is_empty());
    }

    #[test]
    fn test_bullet_hits_obstacle_above_ship() {
        let mut field = Playfield::new(400.0, 800.0);
        let ship_x = field.ship.x;
        let id = field.spawn_obstacle('B', ship_x, 1000.0);
        let bullet = field.fire_bullet();

        let mut hit = None;
        for _ in 0..200 {
            if let Some(c) = field
                .step(0.01)
                .into_iter()
                .find(|c| matches!(c.kind, ContactKind::Shot(_)))
            {
                hit = Some(c);
                break;
            }
        }

        let hit = hit.expect("bullet should reach the letter");
        assert_eq!(hit.kind, ContactKind::Shot(bullet));
        assert_eq!(hit.obstacle, id);
        assert_eq!(hit.letter, 'B');
    }

    #[test]
    fn test_bullets_leave_the_field() {
        let mut field = Playfield::new(400.0, 300.0);
        field.fire_bullet();
        field.step(2.0);
        assert!(field.bullets().is_empty());
    }

    #[test]
    fn test_ship_contact() {
        let mut field = Playfield::new(400.0, 800.0);
        let ship_x = field.ship.x;
        field.spawn_obstacle('S', ship_x, 10.0);
        // obstacle centre at y = 150 overlaps the ship's top edge at 135
        let t = (840.0 - 150.0) / 880.0 * 10.0;

        let contacts = field.step(t);
        assert_eq!(kinds(&contacts), vec![ContactKind::Ship]);
    }

    #[test]
    fn test_move_ship_clamps_and_sets_pose() {
        let mut field = Playfield::new(400.0, 800.0);

        field.move_ship(-1000.0);
        assert_eq!(field.ship.x, SHIP_WIDTH / 2.0);
        assert_eq!(field.ship.pose, ShipPose::Left);

        field.move_ship(1000.0);
        assert_eq!(field.ship.x, 400.0 - SHIP_WIDTH / 2.0);
        assert_eq!(field.ship.pose, ShipPose::Right);

        field.settle_ship();
        assert_eq!(field.ship.pose, ShipPose::Idle);
    }

    #[test]
    fn test_clear() {
        let mut field = Playfield::new(400.0, 800.0);
        field.spawn_obstacle('A', 10.0, 5.0);
        field.fire_bullet();
        field.clear();
        assert!(!field.has_obstacles());
        assert!(field.bullets().is_empty());
    }
}
