//! 4×4 row-major matrix operations for the transform pipeline.
//!
//! Row-vector convention: a vertex `v` is transformed as `v · M`, translation
//! lives in row 3. `a.multiply(&b)` therefore applies `a` first, then `b`.

/// A 4×4 row-major `f32` matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub m: [[f32; 4]; 4],
}

impl Matrix4 {
    /// The neutral element of [`Matrix4::multiply`].
    pub fn identity() -> Matrix4 {
        let mut out = Matrix4 { m: [[0.0; 4]; 4] };
        out.m[0][0] = 1.0;
        out.m[1][1] = 1.0;
        out.m[2][2] = 1.0;
        out.m[3][3] = 1.0;
        out
    }

    /// Standard row-major product `self · rhs`. Not commutative. The result is
    /// accumulated into a fresh matrix, so either operand may alias the
    /// destination at the call site.
    pub fn multiply(&self, rhs: &Matrix4) -> Matrix4 {
        let mut out = Matrix4 { m: [[0.0; 4]; 4] };
        for i in 0..4 {
            for j in 0..4 {
                out.m[i][j] = self.m[i][0] * rhs.m[0][j]
                    + self.m[i][1] * rhs.m[1][j]
                    + self.m[i][2] * rhs.m[2][j]
                    + self.m[i][3] * rhs.m[3][j];
            }
        }
        out
    }

    /// Post-multiplies a translation into `self` using the direct column-sum
    /// form: row 3 accumulates the offset expressed in `self`'s own basis
    /// vectors. Equivalent to the full product `T(tx,ty,tz) · self`, since a
    /// translation matrix only differs from identity in row 3.
    pub fn translated(&self, tx: f32, ty: f32, tz: f32) -> Matrix4 {
        let mut out = *self;
        for j in 0..4 {
            out.m[3][j] += self.m[0][j] * tx + self.m[1][j] * ty + self.m[2][j] * tz;
        }
        out
    }

    /// Left-multiplies a Rodrigues rotation about `(x, y, z)` into `self`,
    /// i.e. the rotation applies after any transform already accumulated in
    /// `self`. A zero-magnitude axis is a defined no-op, not an error.
    pub fn rotated(&self, angle_degrees: f32, x: f32, y: f32, z: f32) -> Matrix4 {
        let magnitude = (x * x + y * y + z * z).sqrt();
        if magnitude <= 0.0 {
            return *self;
        }

        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let (x, y, z) = (x / magnitude, y / magnitude, z / magnitude);
        let one_minus_cos = 1.0 - cos;

        let mut rot = Matrix4::identity();
        rot.m[0][0] = one_minus_cos * x * x + cos;
        rot.m[1][0] = one_minus_cos * x * y - z * sin;
        rot.m[2][0] = one_minus_cos * z * x + y * sin;
        rot.m[0][1] = one_minus_cos * x * y + z * sin;
        rot.m[1][1] = one_minus_cos * y * y + cos;
        rot.m[2][1] = one_minus_cos * y * z - x * sin;
        rot.m[0][2] = one_minus_cos * z * x - y * sin;
        rot.m[1][2] = one_minus_cos * y * z + x * sin;
        rot.m[2][2] = one_minus_cos * z * z + cos;

        rot.multiply(self)
    }

    /// Left-multiplies a symmetric-frustum perspective projection into `self`.
    /// Degenerate camera parameters (`z_far == z_near`, `sin(fovy/2) == 0` or
    /// `aspect == 0`) return `self` unchanged rather than producing NaN/Inf.
    pub fn with_perspective(
        &self,
        fovy_degrees: f32,
        aspect: f32,
        z_near: f32,
        z_far: f32,
    ) -> Matrix4 {
        let radians = (fovy_degrees / 2.0).to_radians();
        let delta_z = z_far - z_near;
        let sine = radians.sin();
        if delta_z == 0.0 || sine == 0.0 || aspect == 0.0 {
            return *self;
        }
        let cotangent = radians.cos() / sine;

        let mut proj = Matrix4 { m: [[0.0; 4]; 4] };
        proj.m[0][0] = cotangent / aspect;
        proj.m[1][1] = cotangent;
        proj.m[2][2] = -(z_far + z_near) / delta_z;
        proj.m[2][3] = -1.0;
        proj.m[3][2] = -2.0 * z_near * z_far / delta_z;

        proj.multiply(self)
    }

    /// Flattened row-major layout, the order GLES expects with
    /// `transpose = false`.
    pub fn to_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, row) in self.m.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(row);
        }
        out
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Matrix4::identity()
    }
}
