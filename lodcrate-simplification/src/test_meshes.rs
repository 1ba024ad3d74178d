//! Mesh fixtures shared by the unit tests

use lodcrate_core::{Point3f, TriangleMesh};

pub fn make_single_triangle() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.5, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
    )
}

pub fn make_tetrahedron() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.5, 1.0, 0.0),
            Point3f::new(0.5, 0.5, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

pub fn make_octahedron() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(-1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, -1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(0.0, 0.0, -1.0),
        ],
        vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ],
    )
}

/// Regular icosahedron, outward counter-clockwise faces
pub fn make_icosahedron() -> TriangleMesh {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(-1.0, t, 0.0),
            Point3f::new(1.0, t, 0.0),
            Point3f::new(-1.0, -t, 0.0),
            Point3f::new(1.0, -t, 0.0),
            Point3f::new(0.0, -1.0, t),
            Point3f::new(0.0, 1.0, t),
            Point3f::new(0.0, -1.0, -t),
            Point3f::new(0.0, 1.0, -t),
            Point3f::new(t, 0.0, -1.0),
            Point3f::new(t, 0.0, 1.0),
            Point3f::new(-t, 0.0, -1.0),
            Point3f::new(-t, 0.0, 1.0),
        ],
        vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ],
    )
}

/// `size` x `size` vertex grid in the z = 0 plane, normals along +z
pub fn make_plane_grid(size: usize) -> TriangleMesh {
    make_height_grid(size, |_, _| 0.0)
}

/// Grid displaced by a smooth bump
pub fn make_curved_surface(size: usize) -> TriangleMesh {
    make_height_grid(size, |fx, fy| {
        (fx * std::f32::consts::PI).sin() * (fy * std::f32::consts::PI).sin() * 2.0
    })
}

fn make_height_grid(size: usize, height: impl Fn(f32, f32) -> f32) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32;
            let fy = y as f32 / (size - 1) as f32;
            vertices.push(Point3f::new(x as f32, y as f32, height(fx, fy)));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, tr, bl]);
            faces.push([tr, br, bl]);
        }
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Icosahedron subdivided `levels` times and projected onto the unit sphere
pub fn make_icosphere(levels: usize) -> TriangleMesh {
    let mut mesh = make_icosahedron();
    for v in mesh.vertices.iter_mut() {
        *v = Point3f::from(v.coords.normalize());
    }
    for _ in 0..levels {
        let mut midpoints = std::collections::HashMap::new();
        let mut faces = Vec::with_capacity(mesh.faces.len() * 4);
        let old_faces = std::mem::take(&mut mesh.faces);
        for [a, b, c] in old_faces {
            let mut mid = |i: usize, j: usize| {
                *midpoints.entry((i.min(j), i.max(j))).or_insert_with(|| {
                    let m = (mesh.vertices[i].coords + mesh.vertices[j].coords).normalize();
                    mesh.add_vertex(Point3f::from(m))
                })
            };
            let ab = mid(a, b);
            let bc = mid(b, c);
            let ca = mid(c, a);
            faces.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        mesh.faces = faces;
    }
    mesh
}
