use crate::math::{mat4_mul, mat4_perspective, Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::new(0.0, 0.0, -1.0),
            right: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            yaw,
            pitch,
            fov: std::f32::consts::PI / 3.0,
            near: 0.1,
            far: 1000.0,
        };
        camera.update_vectors();
        camera
    }

    pub fn update_vectors(&mut self) {
        let forward = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize();

        let world_up = Vec3::new(0.0, 1.0, 0.0);
        let right = forward.cross(world_up).normalize();
        let up = right.cross(forward).normalize();

        self.forward = forward;
        self.right = if right.length_squared() < 1e-6 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            right
        };
        self.up = up;
    }

    /// World-to-view matrix with depth growing along `forward`.
    pub fn view_matrix(&self) -> Mat4 {
        let mut m = [0.0; 16];

        m[0] = self.right.x;
        m[4] = self.right.y;
        m[8] = self.right.z;
        m[12] = -self.right.dot(self.position);

        m[1] = self.up.x;
        m[5] = self.up.y;
        m[9] = self.up.z;
        m[13] = -self.up.dot(self.position);

        m[2] = self.forward.x;
        m[6] = self.forward.y;
        m[10] = self.forward.z;
        m[14] = -self.forward.dot(self.position);

        m[15] = 1.0;
        m
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        mat4_perspective(self.fov, aspect, self.near, self.far)
    }

    /// The matrix a sort consumes: projection composed with view.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        mat4_mul(&self.projection_matrix(aspect), &self.view_matrix())
    }
}

pub fn look_at_target(camera: &mut Camera, target: Vec3) {
    let to_target = (target - camera.position).normalize();
    if to_target.length_squared() < 1e-8 {
        return;
    }
    camera.yaw = to_target.z.atan2(to_target.x);
    camera.pitch = to_target.y.clamp(-1.0, 1.0).asin();
    camera.update_vectors();
}

pub fn look_at_origin(camera: &mut Camera) {
    look_at_target(camera, Vec3::new(0.0, 0.0, 0.0));
}
