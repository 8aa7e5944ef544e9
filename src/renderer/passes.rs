//! Per-frame render stage sequencing.
//!
//! The masked-hole effect is a fixed sequence of four stages, each with its
//! own stencil/color/depth write configuration. The configuration lives in
//! [`STAGES`] as data; pipelines are built from it once at startup and the
//! frame loop walks the table in order. No stage may be skipped or reordered:
//! each stage's buffer state is a precondition for the next.

pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// What a stage draws.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StageGeometry {
    Tetrahedron,
    Holes,
    /// Nothing; the stage only restores write masks for what follows.
    None,
    Torus,
}

/// Complete write-mask/test state a stage requires while its geometry is
/// in flight.
pub struct StageDesc {
    pub name: &'static str,
    pub stencil_write_mask: u32,
    pub stencil_compare: wgpu::CompareFunction,
    pub stencil_ref: u32,
    pub stencil_pass_op: wgpu::StencilOperation,
    pub color_writes: wgpu::ColorWrites,
    pub depth_write: bool,
    pub geometry: StageGeometry,
}

/// The frame sequence. Stage 1 stamps the stencil buffer with 1 under the
/// silhouette while writing color and depth normally. Stage 2 draws the hole
/// circles with color and depth writes off; its stencil write mask stays 0,
/// so the circles leave the stencil contents untouched as well. Stage 3
/// restores the default write masks. Stage 4 composites the blended torus,
/// unaffected by the stencil contents.
pub const STAGES: [StageDesc; 4] = [
    StageDesc {
        name: "silhouette",
        stencil_write_mask: 0xFF,
        stencil_compare: wgpu::CompareFunction::Always,
        stencil_ref: 1,
        stencil_pass_op: wgpu::StencilOperation::Replace,
        color_writes: wgpu::ColorWrites::ALL,
        depth_write: true,
        geometry: StageGeometry::Tetrahedron,
    },
    StageDesc {
        name: "hole punch",
        stencil_write_mask: 0x00,
        stencil_compare: wgpu::CompareFunction::Always,
        stencil_ref: 0,
        stencil_pass_op: wgpu::StencilOperation::Keep,
        color_writes: wgpu::ColorWrites::empty(),
        depth_write: false,
        geometry: StageGeometry::Holes,
    },
    StageDesc {
        name: "mask restore",
        stencil_write_mask: 0x00,
        stencil_compare: wgpu::CompareFunction::Always,
        stencil_ref: 0,
        stencil_pass_op: wgpu::StencilOperation::Keep,
        color_writes: wgpu::ColorWrites::ALL,
        depth_write: true,
        geometry: StageGeometry::None,
    },
    StageDesc {
        name: "overlay",
        stencil_write_mask: 0x00,
        stencil_compare: wgpu::CompareFunction::Always,
        stencil_ref: 0,
        stencil_pass_op: wgpu::StencilOperation::Keep,
        color_writes: wgpu::ColorWrites::ALL,
        depth_write: true,
        geometry: StageGeometry::Torus,
    },
];

pub fn stencil_state(stage: &StageDesc) -> wgpu::StencilState {
    let face = wgpu::StencilFaceState {
        compare: stage.stencil_compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: stage.stencil_pass_op,
    };

    wgpu::StencilState {
        front: face,
        back: face,
        read_mask: 0xFF,
        write_mask: stage.stencil_write_mask,
    }
}

pub fn depth_stencil_state(stage: &StageDesc) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled: stage.depth_write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: stencil_state(stage),
        bias: wgpu::DepthBiasState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_fixed() {
        let order: Vec<StageGeometry> = STAGES.iter().map(|s| s.geometry).collect();
        assert_eq!(
            order,
            vec![
                StageGeometry::Tetrahedron,
                StageGeometry::Holes,
                StageGeometry::None,
                StageGeometry::Torus,
            ]
        );
    }

    #[test]
    fn test_only_silhouette_writes_stencil() {
        assert_eq!(STAGES[0].stencil_write_mask, 0xFF);
        for stage in &STAGES[1..] {
            assert_eq!(stage.stencil_write_mask, 0x00, "stage {}", stage.name);
        }
    }

    #[test]
    fn test_stencil_refs() {
        let refs: Vec<u32> = STAGES.iter().map(|s| s.stencil_ref).collect();
        assert_eq!(refs, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_every_stage_passes_stencil_unconditionally() {
        for stage in &STAGES {
            assert_eq!(stage.stencil_compare, wgpu::CompareFunction::Always);
        }
    }

    #[test]
    fn test_hole_stage_disables_color_and_depth() {
        let holes = &STAGES[1];
        assert_eq!(holes.color_writes, wgpu::ColorWrites::empty());
        assert!(!holes.depth_write);
    }

    #[test]
    fn test_restore_stage_reenables_writes() {
        let restore = &STAGES[2];
        assert_eq!(restore.geometry, StageGeometry::None);
        assert_eq!(restore.color_writes, wgpu::ColorWrites::ALL);
        assert!(restore.depth_write);
    }

    #[test]
    fn test_overlay_draws_with_full_writes() {
        let overlay = &STAGES[3];
        assert_eq!(overlay.color_writes, wgpu::ColorWrites::ALL);
        assert!(overlay.depth_write);
        assert_eq!(overlay.stencil_pass_op, wgpu::StencilOperation::Keep);
    }

    #[test]
    fn test_depth_stencil_state_carries_stage_masks() {
        let state = depth_stencil_state(&STAGES[0]);
        assert_eq!(state.format, DEPTH_STENCIL_FORMAT);
        assert!(state.depth_write_enabled);
        assert_eq!(state.stencil.write_mask, 0xFF);
        assert_eq!(state.stencil.front.pass_op, wgpu::StencilOperation::Replace);

        let state = depth_stencil_state(&STAGES[1]);
        assert!(!state.depth_write_enabled);
        assert_eq!(state.stencil.write_mask, 0x00);
    }
}
