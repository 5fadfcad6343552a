use crate::network::sockets::{SocketRole, resolve_world};
use crate::scene::node::{Pose, SceneNode};
use crate::scene::template::SegmentTemplate;
use crate::util::{heading_of, wrap_angle};
use glam::{Affine3A, Vec3};

/// Where an instance ended up and where its neighbours attach.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub entry: Pose,
    pub exit: Option<Pose>,
    pub branch_left: Option<Pose>,
    pub branch_right: Option<Pose>,
    pub world: Affine3A,
    pub mirrored: bool,
}

impl Placement {
    /// Signed heading change from entry to exit, as seen in world space. Zero without an exit.
    pub fn turn(&self) -> f32 {
        self.exit
            .map(|exit| wrap_angle(heading_of(exit.rotation) - heading_of(self.entry.rotation)))
            .unwrap_or(0.0)
    }
}

const MIRROR_SCALE: Vec3 = Vec3::new(-1.0, 1.0, 1.0);

/// Moves `instance` (a clone of `template`'s prototype) so that its entry socket coincides with
/// `target`. Mirroring flips the local X axis, which also turns curves the other way.
///
/// Doesn't touch the grid or any pool.
pub fn place(template: &SegmentTemplate, instance: &mut SceneNode, target: Pose, mirror: bool) -> Placement {
    let entry = template.sockets.entry_or_origin();
    let (entry, scale) = if mirror {
        (entry.mirrored_x(), MIRROR_SCALE)
    } else {
        (entry, Vec3::ONE)
    };

    let rotation = (target.rotation * entry.rotation.inverse()).normalize();
    let translation = target.translation - rotation * entry.translation;
    instance.set_transform(translation, rotation, scale);

    let sockets = &template.sockets;
    let entry = resolve_world(instance, sockets, SocketRole::Entry).unwrap_or(target);

    Placement {
        entry,
        exit: resolve_world(instance, sockets, SocketRole::Exit),
        branch_left: resolve_world(instance, sockets, SocketRole::BranchLeft),
        branch_right: resolve_world(instance, sockets, SocketRole::BranchRight),
        world: instance.cached_world_matrix(),
        mirrored: mirror,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn entry_coincides_with_target() {
        let template = SegmentTemplate::curve("bend", 20.0, FRAC_PI_4, 1.0);
        let mut instance = template.prototype.deep_clone();
        let target = Pose::from_translation_yaw(Vec3::new(3.0, 0.0, 7.0), 0.3);

        let placement = place(&template, &mut instance, target, false);
        assert!(placement.entry.abs_diff_eq(&target, 1.0e-4));
        assert!((placement.turn() - FRAC_PI_4).abs() < 1.0e-4);
    }

    #[test]
    fn offset_entry_sockets_are_compensated() {
        use crate::network::sockets::SocketTable;
        use crate::scene::template::CurveKind;

        let sockets = SocketTable::default()
            .with(SocketRole::Entry, Pose::from_translation_yaw(Vec3::new(0.0, 0.0, -5.0), 0.0))
            .with(SocketRole::Exit, Pose::from_translation_yaw(Vec3::new(0.0, 0.0, 5.0), 0.0));
        let template = SegmentTemplate::new("centered", 1.0, CurveKind::Straight, 8.0, sockets);
        let mut instance = template.prototype.deep_clone();
        let target = Pose::from_translation_yaw(Vec3::new(10.0, 0.0, 0.0), FRAC_PI_2);

        let placement = place(&template, &mut instance, target, false);
        let exit = placement.exit.expect("exit");
        assert!(exit.translation.abs_diff_eq(Vec3::new(20.0, 0.0, 0.0), 1.0e-4));
        assert!(instance.translation().abs_diff_eq(Vec3::new(15.0, 0.0, 0.0), 1.0e-4));
    }

    #[test]
    fn mirrored_curve_turns_the_other_way() {
        let template = SegmentTemplate::curve("bend", 20.0, FRAC_PI_4, 1.0);
        let mut instance = template.prototype.deep_clone();

        let placement = place(&template, &mut instance, Pose::IDENTITY, true);
        assert!(placement.mirrored);
        assert!(instance.is_mirrored());
        assert!((placement.turn() + FRAC_PI_4).abs() < 1.0e-4);
        assert!(placement.exit.expect("exit").translation.x < 0.0);
        assert!(placement.entry.rotation.abs_diff_eq(Quat::IDENTITY, 1.0e-5));
    }
}
