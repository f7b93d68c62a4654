use crate::error::MeshError;

/// Floats per point: `x, y, z, w`.
pub const POINT_STRIDE: usize = 4;

const MAX_INDEXED_POINTS: usize = u16::MAX as usize + 1;

const AXIS_RADIUS: f32 = 0.003;
const AXIS_LENGTH: f32 = 5.0;
const AXIS_RING: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Lines,
    Triangles,
}

impl PrimitiveKind {
    pub fn indices_per_primitive(self) -> usize {
        match self {
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Triangles => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub points: Vec<f32>,
    pub indexes: Vec<u16>,
}

impl MeshBuffers {
    pub fn point_count(&self) -> usize {
        self.points.len() / POINT_STRIDE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    X,
    Y,
    Z,
}

impl AxisKind {
    pub const ALL: [AxisKind; 3] = [AxisKind::X, AxisKind::Y, AxisKind::Z];

    pub fn name(self) -> &'static str {
        match self {
            AxisKind::X => "x",
            AxisKind::Y => "y",
            AxisKind::Z => "z",
        }
    }

    pub fn color(self) -> [f32; 4] {
        match self {
            AxisKind::X => [1.0, 0.0, 0.0, 1.0],
            AxisKind::Y => [0.0, 1.0, 0.0, 1.0],
            AxisKind::Z => [0.0, 0.0, 1.0, 1.0],
        }
    }

    /// Moves the glyph's depth coordinate onto this axis.
    fn orient(self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        match self {
            AxisKind::X => [z, y, x],
            AxisKind::Y => [x, z, y],
            AxisKind::Z => [x, y, z],
        }
    }
}

/// Number of grid rows and columns for a `width` x `height` patch sampled
/// every `resolution` units.
pub fn grid_dimensions(
    width: f32,
    height: f32,
    resolution: f32,
) -> Result<(usize, usize), MeshError> {
    if !(resolution > 0.0) || !resolution.is_finite() {
        return Err(MeshError::invalid_grid(format!(
            "resolution must be positive, got {resolution}"
        )));
    }
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return Err(MeshError::invalid_grid(format!(
            "extent must be positive, got {width} x {height}"
        )));
    }

    let rows = (height / resolution).round() as usize;
    let cols = (width / resolution).round() as usize;
    Ok((rows, cols))
}

/// Builds a flat grid centred on the origin.
///
/// Points are laid out row-major, `i` stepping along x over `height` and `j`
/// along y over `width`, all with `z = 0` and `w = 1`. Each cell becomes two
/// triangles; in line mode every triangle edge is emitted instead.
pub fn make_surface(
    width: f32,
    height: f32,
    resolution: f32,
    kind: PrimitiveKind,
) -> Result<MeshBuffers, MeshError> {
    let (rows, cols) = grid_dimensions(width, height, resolution)?;

    let count = rows * cols;
    if count > MAX_INDEXED_POINTS {
        return Err(MeshError::TooManyVertices {
            count,
            max: MAX_INDEXED_POINTS,
        });
    }

    let mut points = Vec::with_capacity(count * POINT_STRIDE);
    for i in 0..rows {
        for j in 0..cols {
            points.push(i as f32 * resolution - height / 2.0);
            points.push(j as f32 * resolution - width / 2.0);
            points.push(0.0);
            points.push(1.0);
        }
    }

    let triangles = grid_triangles(rows, cols);
    let indexes = match kind {
        PrimitiveKind::Triangles => triangles,
        PrimitiveKind::Lines => triangle_edges(&triangles),
    };

    Ok(MeshBuffers { points, indexes })
}

fn grid_triangles(rows: usize, cols: usize) -> Vec<u16> {
    let cells = rows.saturating_sub(1) * cols.saturating_sub(1);
    let mut indexes = Vec::with_capacity(cells * 6);

    for i in 0..rows.saturating_sub(1) {
        for j in 0..cols.saturating_sub(1) {
            let top_left = (i * cols + j) as u16;
            let top_right = (i * cols + j + 1) as u16;
            let bottom_left = ((i + 1) * cols + j) as u16;
            let bottom_right = ((i + 1) * cols + j + 1) as u16;

            indexes.extend_from_slice(&[top_left, top_right, bottom_left]);
            indexes.extend_from_slice(&[bottom_left, top_right, bottom_right]);
        }
    }

    indexes
}

/// Re-emits every triangle `(a, b, c)` as the segments `ab`, `bc`, `ca`.
pub fn triangle_edges(triangles: &[u16]) -> Vec<u16> {
    triangles
        .chunks_exact(3)
        .flat_map(|t| [t[0], t[1], t[1], t[2], t[2], t[0]])
        .collect()
}

/// Builds the arrow glyph for one axis: a thin octagonal tube from the
/// origin out to depth 5 along that axis.
pub fn make_axis(axis: AxisKind) -> MeshBuffers {
    let diagonal = AXIS_RADIUS * std::f32::consts::FRAC_PI_4.cos();
    let ring: [[f32; 2]; AXIS_RING] = [
        [AXIS_RADIUS, 0.0],
        [diagonal, diagonal],
        [0.0, AXIS_RADIUS],
        [-diagonal, diagonal],
        [-AXIS_RADIUS, 0.0],
        [-diagonal, -diagonal],
        [0.0, -AXIS_RADIUS],
        [diagonal, -diagonal],
    ];

    let mut points = Vec::with_capacity(2 * AXIS_RING * POINT_STRIDE);
    for depth in [0.0, AXIS_LENGTH] {
        for [x, y] in ring {
            points.extend_from_slice(&axis.orient([x, y, depth]));
            points.push(1.0);
        }
    }

    let ring = AXIS_RING as u16;
    let mut indexes = Vec::with_capacity(42);
    for i in 0..ring - 1 {
        indexes.extend_from_slice(&[i, i + 1, i + ring]);
        indexes.extend_from_slice(&[i + 1, i + ring, i + ring + 1]);
    }

    MeshBuffers { points, indexes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_index_count_matches_cells() {
        let mesh = make_surface(4.0, 3.0, 1.0, PrimitiveKind::Triangles).unwrap();
        assert_eq!(mesh.point_count(), 12);
        assert_eq!(mesh.indexes.len(), 6 * (3 - 1) * (4 - 1));
        assert!(mesh.indexes.iter().all(|&i| (i as usize) < mesh.point_count()));
    }

    #[test]
    fn points_are_row_major_and_centred() {
        let mesh = make_surface(4.0, 2.0, 1.0, PrimitiveKind::Triangles).unwrap();
        let first: Vec<f32> = mesh.points[0..4].to_vec();
        let second: Vec<f32> = mesh.points[4..8].to_vec();
        let next_row: Vec<f32> = mesh.points[16..20].to_vec();

        assert_eq!(first, vec![-1.0, -2.0, 0.0, 1.0]);
        assert_eq!(second, vec![-1.0, -1.0, 0.0, 1.0]);
        assert_eq!(next_row, vec![0.0, -2.0, 0.0, 1.0]);
    }

    #[test]
    fn first_cell_winding() {
        let mesh = make_surface(3.0, 3.0, 1.0, PrimitiveKind::Triangles).unwrap();
        assert_eq!(&mesh.indexes[0..6], &[0, 1, 3, 3, 1, 4]);
    }

    #[test]
    fn line_mode_expands_each_triangle_to_three_edges() {
        let tris = make_surface(3.0, 3.0, 1.0, PrimitiveKind::Triangles).unwrap();
        let lines = make_surface(3.0, 3.0, 1.0, PrimitiveKind::Lines).unwrap();

        assert_eq!(lines.points, tris.points);
        assert_eq!(lines.indexes.len(), tris.indexes.len() * 2);
        assert_eq!(lines.indexes.len() % 2, 0);
        assert_eq!(&lines.indexes[0..6], &[0, 1, 1, 3, 3, 0]);
    }

    #[test]
    fn default_plot_grid_fits_u16() {
        let mesh = make_surface(1.1, 1.1, 0.01, PrimitiveKind::Triangles).unwrap();
        assert_eq!(mesh.point_count(), 110 * 110);
        assert_eq!(mesh.indexes.len(), 6 * 109 * 109);
        assert_eq!(mesh.points.len() % POINT_STRIDE, 0);
        assert_eq!(mesh.indexes.len() % 3, 0);
        assert!(mesh.indexes.iter().all(|&i| (i as usize) < mesh.point_count()));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert_eq!(
            make_surface(300.0, 300.0, 1.0, PrimitiveKind::Lines),
            Err(MeshError::TooManyVertices {
                count: 90_000,
                max: 65_536,
            })
        );
    }

    #[test]
    fn degenerate_grid_is_rejected() {
        assert!(matches!(
            make_surface(1.0, 1.0, 0.0, PrimitiveKind::Lines),
            Err(MeshError::InvalidGrid { .. })
        ));
        assert!(matches!(
            make_surface(-1.0, 1.0, 0.1, PrimitiveKind::Lines),
            Err(MeshError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn single_row_has_no_cells() {
        let mesh = make_surface(3.0, 1.0, 1.0, PrimitiveKind::Triangles).unwrap();
        assert_eq!(mesh.point_count(), 3);
        assert!(mesh.indexes.is_empty());
    }

    #[test]
    fn axis_glyph_shape() {
        for axis in AxisKind::ALL {
            let mesh = make_axis(axis);
            assert_eq!(mesh.point_count(), 16);
            assert_eq!(mesh.indexes.len(), 42);
            assert!(mesh.indexes.iter().all(|&i| i < 16));
        }
    }

    #[test]
    fn axis_depth_follows_axis() {
        let x = make_axis(AxisKind::X);
        let y = make_axis(AxisKind::Y);
        let z = make_axis(AxisKind::Z);

        // the first far point sits at index 8
        let far = 8 * POINT_STRIDE;
        assert_eq!(x.points[far], AXIS_LENGTH);
        assert_eq!(y.points[far + 1], AXIS_LENGTH);
        assert_eq!(z.points[far + 2], AXIS_LENGTH);
        // near ring lies on the origin plane
        assert_eq!(z.points[2], 0.0);
        assert_eq!(z.points[0], AXIS_RADIUS);
    }
}
