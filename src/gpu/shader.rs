//! Shader compilation and program linking (GLSL ES 1.00)

use anyhow::{anyhow, Result};
use glow::HasContext;
use log::{debug, error};

/// Compile one shader stage.
///
/// The compile log is included in the error and logged.
pub fn load_shader(gl: &glow::Context, shader_type: u32, source: &str) -> Result<glow::Shader> {
    unsafe {
        let shader = gl.create_shader(shader_type).map_err(|e| {
            error!("glCreateShader failed: {}", e);
            anyhow!("Failed to create shader: {}", e)
        })?;

        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            let type_name = stage_name(shader_type);
            error!("Error compiling {} shader:\n{}", type_name, log);
            return Err(anyhow!("{} shader compile failed: {}", type_name, log));
        }

        Ok(shader)
    }
}

/// Compile both stages and link them into a program
pub fn load_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program> {
    unsafe {
        let vs = load_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
        let fs = match load_shader(gl, glow::FRAGMENT_SHADER, fragment_src) {
            Ok(fs) => fs,
            Err(e) => {
                gl.delete_shader(vs);
                return Err(e);
            }
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(e) => {
                gl.delete_shader(vs);
                gl.delete_shader(fs);
                error!("glCreateProgram failed: {}", e);
                return Err(anyhow!("Failed to create program: {}", e));
            }
        };

        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        // Shader objects no longer needed after linking
        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            error!("Error linking shader program:\n{}", log);
            return Err(anyhow!("Shader link failed: {}", log));
        }

        debug!("Shader program linked");
        Ok(program)
    }
}

/// Uniform lookup that fails loudly on a typo'd or optimized-out name
pub fn uniform_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
) -> Result<glow::UniformLocation> {
    unsafe { gl.get_uniform_location(program, name) }
        .ok_or_else(|| anyhow!("{} uniform not found", name))
}

/// Attribute lookup, same contract as [`uniform_location`]
pub fn attrib_location(gl: &glow::Context, program: glow::Program, name: &str) -> Result<u32> {
    unsafe { gl.get_attrib_location(program, name) }
        .ok_or_else(|| anyhow!("{} attribute not found", name))
}

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(stage_name(glow::VERTEX_SHADER), "vertex");
        assert_eq!(stage_name(glow::FRAGMENT_SHADER), "fragment");
        assert_eq!(stage_name(0), "unknown");
    }
}
