//! Textured, depth-tested rotating sphere

use anyhow::{anyhow, Result};
use glow::HasContext;
use khronos_egl as egl;
use log::info;

use glesh::bitmap::PixelFormat;
use glesh::geometry::{sphere, Object};
use glesh::gpu::{attrib_location, load_program, uniform_location, AttribLocations, GpuMesh};
use glesh::pool::Handle;
use glesh::{execute_main_loop, FrameInfo, LoopOptions, RenderingContext, ResultSink};

/// Default request plus a 16-bit depth buffer
pub const CONFIG_ATTRIBS: [egl::Int; 7] = [
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::RENDERABLE_TYPE,
    egl::OPENGL_ES2_BIT,
    egl::DEPTH_SIZE,
    16,
    egl::NONE,
];

const VERTEX_SHADER: &str = "\
attribute vec4 a_position;
attribute vec2 a_texcoord;
uniform mediump mat4 u_pmatrix;
uniform mediump mat4 u_mvmatrix;
varying mediump vec2 v_texcoord;
void main()
{
    gl_Position = u_pmatrix * u_mvmatrix * a_position;
    v_texcoord = a_texcoord;
}
";

const FRAGMENT_SHADER: &str = "\
uniform sampler2D s_texture;
varying mediump vec2 v_texcoord;
void main()
{
    gl_FragColor = texture2D(s_texture, v_texcoord);
}
";

const SLICES: u32 = 48;
const TEXTURE_SIZE: u32 = 256;

struct Scene {
    program: glow::Program,
    mesh: GpuMesh,
    locations: AttribLocations,
    pmatrix: glow::UniformLocation,
    mvmatrix: glow::UniformLocation,
    globe: Handle<Object>,
}

impl Scene {
    fn init(ctx: &mut RenderingContext) -> Result<Self> {
        let texture = ctx.generate_texture(
            PixelFormat::Rgb565,
            TEXTURE_SIZE,
            TEXTURE_SIZE,
            "sphere_pattern",
        )?;

        let mut object = sphere(SLICES, 1.5)?;
        object.modelview.translate(0.0, 0.0, -5.0);
        object.attach_texture(texture);
        info!(
            "Sphere: {} vertices, {} triangles",
            object.num_vertices(),
            object.num_triangles
        );

        let gl = ctx.gl()?;
        let program = load_program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let locations = AttribLocations {
            position: attrib_location(gl, program, "a_position")?,
            normal: None,
            texcoord: Some(attrib_location(gl, program, "a_texcoord")?),
        };
        let pmatrix = uniform_location(gl, program, "u_pmatrix")?;
        let mvmatrix = uniform_location(gl, program, "u_mvmatrix")?;
        let sampler = uniform_location(gl, program, "s_texture")?;
        let mesh = GpuMesh::upload(gl, &object)?;

        let globe = ctx.add_object(object)?;

        let aspect = ctx.aspect_ratio();
        ctx.perspective.set_to_identity();
        ctx.perspective.perspective(60.0, aspect, 1.0, 20.0);

        let tex_id = ctx
            .texture(texture)
            .map(|t| t.id)
            .ok_or_else(|| anyhow!("sphere texture missing"))?;

        let gl = ctx.gl()?;
        unsafe {
            gl.clear_color(0.0, 0.0, 0.2, 0.0);
            gl.enable(glow::DEPTH_TEST);
            gl.use_program(Some(program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(tex_id));
            gl.uniform_1_i32(Some(&sampler), 0);
            gl.viewport(0, 0, ctx.width() as i32, ctx.height() as i32);
        }

        Ok(Self {
            program,
            mesh,
            locations,
            pmatrix,
            mvmatrix,
            globe,
        })
    }

    fn draw(&mut self, ctx: &mut RenderingContext, frame: &FrameInfo) -> Result<()> {
        let step = frame.time_step as f32;
        let globe = ctx
            .object_mut(self.globe)
            .ok_or_else(|| anyhow!("sphere object missing"))?;
        globe.modelview.rotate(30.0 * step, 0.0, 1.0, 0.0);
        globe.modelview.rotate(10.0 * step, 1.0, 0.0, 0.0);
        let modelview = globe.modelview.to_cols_array();
        let perspective = ctx.perspective.to_cols_array();

        let gl = ctx.gl()?;
        unsafe {
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.uniform_matrix_4_f32_slice(Some(&self.mvmatrix), false, &modelview);
            gl.uniform_matrix_4_f32_slice(Some(&self.pmatrix), false, &perspective);
        }
        self.mesh.draw(gl, &self.locations);

        ctx.swap_buffers()
    }

    fn release(self, ctx: &RenderingContext) {
        if let Ok(gl) = ctx.gl() {
            self.mesh.destroy(gl);
            unsafe {
                gl.disable(glow::DEPTH_TEST);
                gl.delete_program(self.program);
            }
        }
    }
}

pub fn run(ctx: &mut RenderingContext, sink: &mut dyn ResultSink, options: &LoopOptions) -> Result<()> {
    let mut scene = Scene::init(ctx)?;
    let result = execute_main_loop(ctx, sink, options, |ctx, frame| scene.draw(ctx, frame));
    scene.release(ctx);
    Ok(result?)
}
