//! glamの型を再エクスポート（クレート間でバージョンを揃えるため）

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
