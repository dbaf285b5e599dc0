use glam::{IVec2, Vec2};

use crate::api::NarrowphaseApi;
use crate::types::*;

/// Box primitives and pair filtering used by the probes.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn overlap_box_box(a: &BoundingBox, b: &BoundingBox) -> bool {
        a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
    }

    fn box_contains_point(b: &BoundingBox, p: Vec2) -> bool {
        p.x >= b.x && p.x <= b.x + b.width && p.y >= b.y && p.y <= b.y + b.height
    }

    fn box_contains_box(outer: &BoundingBox, inner: &BoundingBox) -> bool {
        inner.x >= outer.x
            && inner.y >= outer.y
            && inner.x + inner.width <= outer.x + outer.width
            && inner.y + inner.height <= outer.y + outer.height
    }

    fn collision_side(delta: IVec2) -> CollisionSide {
        // X wins for diagonal probes; the resolver only probes one axis at a time.
        if delta.x > 0 {
            CollisionSide::OnRight
        } else if delta.x < 0 {
            CollisionSide::OnLeft
        } else if delta.y > 0 {
            CollisionSide::OnUp
        } else if delta.y < 0 {
            CollisionSide::OnDown
        } else {
            CollisionSide::Unknown
        }
    }

    fn pair_response(
        a_mask: CollisionMask,
        a_tag: EntityTag,
        b_mask: CollisionMask,
        b_tag: EntityTag,
    ) -> PairResponse {
        // Mutual consent: both sides must accept the other's tag.
        if !(a_mask.accepts(b_tag) && b_mask.accepts(a_tag)) {
            return PairResponse::Ignore;
        }
        if a_mask == CollisionMask::Sensor || b_mask == CollisionMask::Sensor {
            PairResponse::Contact
        } else {
            PairResponse::Solid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let touching = BoundingBox::new(10.0, 0.0, 10.0, 10.0);
        let inside = BoundingBox::new(9.0, 9.0, 5.0, 5.0);
        assert!(!Narrowphase::overlap_box_box(&a, &touching));
        assert!(Narrowphase::overlap_box_box(&a, &inside));
        assert!(Narrowphase::overlap_box_box(&inside, &a));
    }

    #[test]
    fn test_containment() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(Narrowphase::box_contains_point(&outer, Vec2::new(10.0, 0.0)));
        assert!(!Narrowphase::box_contains_point(&outer, Vec2::new(10.5, 0.0)));
        assert!(Narrowphase::box_contains_box(&outer, &BoundingBox::new(2.0, 2.0, 8.0, 8.0)));
        assert!(!Narrowphase::box_contains_box(&outer, &BoundingBox::new(2.0, 2.0, 9.0, 8.0)));
    }

    #[test]
    fn test_collision_side_from_displacement() {
        assert_eq!(Narrowphase::collision_side(IVec2::new(3, 0)), CollisionSide::OnRight);
        assert_eq!(Narrowphase::collision_side(IVec2::new(-1, 0)), CollisionSide::OnLeft);
        assert_eq!(Narrowphase::collision_side(IVec2::new(0, 2)), CollisionSide::OnUp);
        assert_eq!(Narrowphase::collision_side(IVec2::new(0, -15)), CollisionSide::OnDown);
        assert_eq!(Narrowphase::collision_side(IVec2::ZERO), CollisionSide::Unknown);
    }

    #[test]
    fn test_pair_response() {
        use CollisionMask::*;
        use EntityTag::*;
        assert_eq!(Narrowphase::pair_response(All, Player, All, Other), PairResponse::Solid);
        assert_eq!(Narrowphase::pair_response(All, Other, OnlyPlayer, Other), PairResponse::Ignore);
        assert_eq!(Narrowphase::pair_response(All, Player, OnlyPlayer, Other), PairResponse::Solid);
        assert_eq!(Narrowphase::pair_response(Sensor, Other, All, Player), PairResponse::Contact);
        assert_eq!(Narrowphase::pair_response(All, Other, Sensor, Other), PairResponse::Contact);
        assert_eq!(
            Narrowphase::pair_response(OnlyEnemy, Enemy, Sensor, Other),
            PairResponse::Ignore
        );
    }
}
