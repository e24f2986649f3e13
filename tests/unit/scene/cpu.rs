use super::*;
use crate::foundation::core::{Background, LightDirection, Orientation};
use crate::scene::mesh::Mesh;

fn quad() -> Mesh {
    Mesh {
        positions: vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        colors: Vec::new(),
        triangles: vec![[0, 1, 2], [0, 2, 3]],
    }
}

fn view(mesh: Option<&Mesh>, anim: Orientation, background: Background) -> SceneView<'_> {
    SceneView {
        mesh,
        base: Orientation::ZERO,
        anim,
        light: LightDirection::default(),
        background,
    }
}

fn render(view: &SceneView<'_>) -> RgbaImage {
    let mut backend = CpuRasterizer::new();
    backend.resize(64, 64);
    let mut img = RgbaImage::new(64, 64);
    backend.render(view, &mut img).unwrap();
    img
}

#[test]
fn empty_scene_is_background_only() {
    let img = render(&view(None, Orientation::ZERO, Background::Solid(Rgb8::new(1, 2, 3))));
    assert!(img.pixels().all(|p| p.0 == [1, 2, 3, 255]));

    let img = render(&view(None, Orientation::ZERO, Background::Transparent));
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn front_facing_quad_covers_center_and_is_lit() {
    let mesh = quad();
    let img = render(&view(Some(&mesh), Orientation::ZERO, Background::Transparent));
    assert_eq!(img.get_pixel(32, 32).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
}

#[test]
fn triangles_are_double_sided() {
    let mesh = quad();
    let flipped = Orientation::new(0.0, std::f64::consts::PI, 0.0);
    let img = render(&view(Some(&mesh), flipped, Background::Transparent));
    assert_eq!(img.get_pixel(32, 32).0[3], 255);
}

#[test]
fn vertex_colors_tint_the_surface() {
    let mut mesh = quad();
    mesh.colors = vec![Rgb8::new(255, 0, 0); 4];
    let img = render(&view(Some(&mesh), Orientation::ZERO, Background::Transparent));
    let p = img.get_pixel(32, 32).0;
    assert_eq!((p[1], p[2], p[3]), (0, 0, 255));
    assert!(p[0] > 200);
}

#[test]
fn rendering_is_deterministic() {
    let mesh = quad();
    let v = view(Some(&mesh), Orientation::new(0.4, 0.9, -0.2), Background::Transparent);
    assert_eq!(render(&v), render(&v));
}

#[test]
fn nearer_surface_wins_the_depth_test() {
    let mut mesh = quad();
    let n = mesh.positions.len() as u32;
    mesh.positions.extend([
        Vec3::new(-0.5, -0.5, 1.0),
        Vec3::new(0.5, -0.5, 1.0),
        Vec3::new(0.0, 0.5, 1.0),
    ]);
    mesh.triangles.push([n, n + 1, n + 2]);
    mesh.colors = [vec![Rgb8::new(0, 0, 255); 4], vec![Rgb8::new(0, 255, 0); 3]].concat();
    let img = render(&view(Some(&mesh), Orientation::ZERO, Background::Transparent));
    let p = img.get_pixel(32, 32).0;
    assert!(p[1] > 0 && p[2] == 0, "{p:?}");
}
