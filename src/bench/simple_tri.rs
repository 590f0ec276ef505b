//! Simple rotating triangle

use anyhow::{anyhow, Result};
use glow::HasContext;

use glesh::geometry::{triangle_strip, Object};
use glesh::gpu::{attrib_location, load_program, uniform_location, AttribLocations, GpuMesh};
use glesh::pool::Handle;
use glesh::{execute_main_loop, FrameInfo, LoopOptions, RenderingContext, ResultSink};

const VERTEX_SHADER: &str = "\
attribute vec4 a_position;
uniform mediump mat4 u_pmatrix;
uniform mediump mat4 u_mvmatrix;
void main()
{
    gl_Position = u_pmatrix * u_mvmatrix * a_position;
}
";

const FRAGMENT_SHADER: &str = "\
uniform mediump float u_color;
void main()
{
    gl_FragColor = vec4(0.0, u_color, 0.4, 0.0);
}
";

/// Degrees per second around the Y axis
const SPIN_RATE: f32 = 30.0;

struct Scene {
    program: glow::Program,
    mesh: GpuMesh,
    locations: AttribLocations,
    pmatrix: glow::UniformLocation,
    mvmatrix: glow::UniformLocation,
    color_loc: glow::UniformLocation,
    color: f32,
    triangle: Handle<Object>,
}

impl Scene {
    fn init(ctx: &mut RenderingContext) -> Result<Self> {
        let mut object = triangle_strip(4.0);
        object.modelview.translate(0.0, 0.0, -5.0);

        let gl = ctx.gl()?;
        let program = load_program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let locations = AttribLocations {
            position: attrib_location(gl, program, "a_position")?,
            ..Default::default()
        };
        let pmatrix = uniform_location(gl, program, "u_pmatrix")?;
        let mvmatrix = uniform_location(gl, program, "u_mvmatrix")?;
        let color_loc = uniform_location(gl, program, "u_color")?;
        let mesh = GpuMesh::upload(gl, &object)?;

        let triangle = ctx.add_object(object)?;

        let aspect = ctx.aspect_ratio();
        ctx.perspective.set_to_identity();
        ctx.perspective.perspective(60.0, aspect, 1.0, 20.0);

        let gl = ctx.gl()?;
        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.use_program(Some(program));
            gl.viewport(0, 0, ctx.width() as i32, ctx.height() as i32);
        }

        Ok(Self {
            program,
            mesh,
            locations,
            pmatrix,
            mvmatrix,
            color_loc,
            color: 0.0,
            triangle,
        })
    }

    fn draw(&mut self, ctx: &mut RenderingContext, frame: &FrameInfo) -> Result<()> {
        self.color += 0.001;
        if self.color >= 1.0 {
            self.color = 0.0;
        }

        let triangle = ctx
            .object_mut(self.triangle)
            .ok_or_else(|| anyhow!("triangle object missing"))?;
        triangle
            .modelview
            .rotate(SPIN_RATE * frame.time_step as f32, 0.0, 1.0, 0.0);
        let modelview = triangle.modelview.to_cols_array();
        let perspective = ctx.perspective.to_cols_array();

        let gl = ctx.gl()?;
        unsafe {
            gl.clear(glow::COLOR_BUFFER_BIT);
            gl.uniform_matrix_4_f32_slice(Some(&self.mvmatrix), false, &modelview);
            gl.uniform_matrix_4_f32_slice(Some(&self.pmatrix), false, &perspective);
            gl.uniform_1_f32(Some(&self.color_loc), self.color);
        }
        self.mesh.draw_strip(gl, &self.locations);

        ctx.swap_buffers()
    }

    fn release(self, ctx: &RenderingContext) {
        if let Ok(gl) = ctx.gl() {
            self.mesh.destroy(gl);
            unsafe { gl.delete_program(self.program) };
        }
    }
}

pub fn run(ctx: &mut RenderingContext, sink: &mut dyn ResultSink, options: &LoopOptions) -> Result<()> {
    let mut scene = Scene::init(ctx)?;
    let result = execute_main_loop(ctx, sink, options, |ctx, frame| scene.draw(ctx, frame));
    scene.release(ctx);
    Ok(result?)
}
