//! GLES2 shader sources for the colored cube.

/// Transforms each vertex by the MVP uniform and forwards its color.
pub const VERTEX_SHADER: &str = "\
uniform mat4   u_mvpMatrix;
attribute vec4 a_position;
attribute vec4 a_color;
varying vec4   v_color;

void main()
{
    gl_Position = u_mvpMatrix * a_position;
    v_color = a_color;
}
";

/// Writes the interpolated vertex color.
pub const FRAGMENT_SHADER: &str = "\
precision mediump float;
varying vec4 v_color;

void main()
{
    gl_FragColor = v_color;
}
";

/// Uniform holding the combined model-view-projection matrix.
pub const MVP_UNIFORM: &str = "u_mvpMatrix";
/// Vertex position attribute.
pub const POSITION_ATTRIBUTE: &str = "a_position";
/// Vertex color attribute.
pub const COLOR_ATTRIBUTE: &str = "a_color";
