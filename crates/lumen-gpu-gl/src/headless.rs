//! A [`GlDriver`] that runs without a GL context.
//!
//! [`HeadlessGl`] "compiles" a stage by scanning its top-level declarations (`in`, `uniform`,
//! uniform blocks) and links by merging them the way a driver would: attributes get the lowest
//! free location unless bound, uniforms get sequential locations (one per array element), samplers
//! start at unit 0 and blocks at their `layout(binding = N)` or 0. It records every object it hands out so callers can
//! check for leaks and double deletes.
//!
//! `#define`, `#ifdef`, `#ifndef`, `#else` and `#endif` are honoured, so per-version defines
//! select declarations the way a real preprocessor would. Two directives trigger failures:
//! `#error <message>` fails compilation and `#link_error <message>` fails any link the stage
//! takes part in.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use crate::driver::{ActiveUniformBlock, ActiveVariable, GlDriver, GlProgram, GlShader};
use crate::gl;
use crate::GlError;

pub const DEFAULT_MAX_UNIFORM_BUFFER_BINDINGS: u32 = 36;

/// Vertex attribute locations available to a program.
const MAX_VERTEX_ATTRIBS: u32 = 16;

fn gl_type_for_glsl(name: &str) -> Option<u32> {
    Some(match name {
        "float" => gl::FLOAT,
        "vec2" => gl::FLOAT_VEC2,
        "vec3" => gl::FLOAT_VEC3,
        "vec4" => gl::FLOAT_VEC4,
        "int" => gl::INT,
        "ivec2" => gl::INT_VEC2,
        "ivec3" => gl::INT_VEC3,
        "ivec4" => gl::INT_VEC4,
        "uint" => gl::UNSIGNED_INT,
        "uvec2" => gl::UNSIGNED_INT_VEC2,
        "uvec3" => gl::UNSIGNED_INT_VEC3,
        "uvec4" => gl::UNSIGNED_INT_VEC4,
        "bool" => gl::BOOL,
        "bvec2" => gl::BOOL_VEC2,
        "bvec3" => gl::BOOL_VEC3,
        "bvec4" => gl::BOOL_VEC4,
        "mat2" => gl::FLOAT_MAT2,
        "mat3" => gl::FLOAT_MAT3,
        "mat4" => gl::FLOAT_MAT4,
        "mat2x3" => gl::FLOAT_MAT2X3,
        "double" => gl::DOUBLE,
        "sampler1D" => gl::SAMPLER_1D,
        "sampler2D" => gl::SAMPLER_2D,
        "sampler3D" => gl::SAMPLER_3D,
        "samplerCube" => gl::SAMPLER_CUBE,
        "sampler1DShadow" => gl::SAMPLER_1D_SHADOW,
        "sampler2DShadow" => gl::SAMPLER_2D_SHADOW,
        "samplerCubeShadow" => gl::SAMPLER_CUBE_SHADOW,
        "sampler2DRect" => gl::SAMPLER_2D_RECT,
        "sampler1DArray" => gl::SAMPLER_1D_ARRAY,
        "sampler2DArray" => gl::SAMPLER_2D_ARRAY,
        "sampler1DArrayShadow" => gl::SAMPLER_1D_ARRAY_SHADOW,
        "sampler2DArrayShadow" => gl::SAMPLER_2D_ARRAY_SHADOW,
        "samplerBuffer" => gl::SAMPLER_BUFFER,
        "sampler2DMS" => gl::SAMPLER_2D_MULTISAMPLE,
        "sampler2DMSArray" => gl::SAMPLER_2D_MULTISAMPLE_ARRAY,
        "isampler1D" => gl::INT_SAMPLER_1D,
        "isampler2D" => gl::INT_SAMPLER_2D,
        "isampler3D" => gl::INT_SAMPLER_3D,
        "isamplerCube" => gl::INT_SAMPLER_CUBE,
        "isampler1DArray" => gl::INT_SAMPLER_1D_ARRAY,
        "isampler2DArray" => gl::INT_SAMPLER_2D_ARRAY,
        "isampler2DMS" => gl::INT_SAMPLER_2D_MULTISAMPLE,
        "isampler2DMSArray" => gl::INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
        "usampler1D" => gl::UNSIGNED_INT_SAMPLER_1D,
        "usampler2D" => gl::UNSIGNED_INT_SAMPLER_2D,
        "usampler3D" => gl::UNSIGNED_INT_SAMPLER_3D,
        "usamplerCube" => gl::UNSIGNED_INT_SAMPLER_CUBE,
        "usampler1DArray" => gl::UNSIGNED_INT_SAMPLER_1D_ARRAY,
        "usampler2DArray" => gl::UNSIGNED_INT_SAMPLER_2D_ARRAY,
        "usampler2DMS" => gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE,
        "usampler2DMSArray" => gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
        _ => return None,
    })
}

/// std140-ish size, only used to report a plausible block data size.
fn std140_size(gl_type: u32) -> u32 {
    match gl_type {
        gl::FLOAT | gl::INT | gl::UNSIGNED_INT | gl::BOOL => 4,
        gl::FLOAT_VEC2 | gl::INT_VEC2 | gl::UNSIGNED_INT_VEC2 | gl::BOOL_VEC2 => 8,
        gl::FLOAT_MAT2 => 32,
        gl::FLOAT_MAT3 | gl::FLOAT_MAT2X3 => 48,
        gl::FLOAT_MAT4 => 64,
        _ => 16,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VariableDecl {
    name: String,
    gl_type: u32,
    size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockDecl {
    name: String,
    /// `layout(binding = N)`, applied at link.
    binding: Option<u32>,
    members: Vec<VariableDecl>,
}

#[derive(Debug, Clone, Default)]
struct Declarations {
    inputs: Vec<VariableDecl>,
    uniforms: Vec<VariableDecl>,
    blocks: Vec<BlockDecl>,
    link_error: Option<String>,
}

fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        let word = c.is_ascii_alphanumeric() || c == '_';
        match (word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(&line[s..i]);
                start = None;
            }
            _ => {}
        }
        if !word && !c.is_whitespace() {
            tokens.push(&line[i..i + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&line[s..]);
    }
    tokens
}

/// `TYPE NAME` or `TYPE NAME [ N ]`, after precision qualifiers.
fn parse_variable(tokens: &[&str]) -> Result<VariableDecl, String> {
    let tokens: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !matches!(*t, "lowp" | "mediump" | "highp" | "flat" | "smooth"))
        .collect();
    let (ty, name, rest) = match tokens.as_slice() {
        [ty, name, rest @ ..] => (*ty, *name, rest),
        _ => return Err(format!("malformed declaration '{}'", tokens.join(" "))),
    };
    let gl_type = gl_type_for_glsl(ty).ok_or_else(|| format!("'{ty}' : undeclared type"))?;
    let size = match rest {
        [] => 1,
        ["[", n, "]"] => n
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("'{name}' : invalid array size '{n}'"))?,
        _ => return Err(format!("'{name}' : syntax error")),
    };
    Ok(VariableDecl {
        name: name.to_owned(),
        gl_type,
        size,
    })
}

fn strip_layout<'a, 'b>(tokens: &'b [&'a str]) -> &'b [&'a str] {
    if tokens.first() != Some(&"layout") {
        return tokens;
    }
    match tokens.iter().position(|t| *t == ")") {
        Some(close) => &tokens[close + 1..],
        None => &tokens[1..],
    }
}

fn layout_binding(tokens: &[&str]) -> Option<u32> {
    if tokens.first() != Some(&"layout") {
        return None;
    }
    let close = tokens.iter().position(|t| *t == ")")?;
    tokens[..close].windows(3).find_map(|w| match w {
        ["binding", "=", n] => n.parse().ok(),
        _ => None,
    })
}

fn parse_statement(tokens: &[&str], decls: &mut Declarations) -> Result<(), String> {
    let binding = layout_binding(tokens);
    let tokens = strip_layout(tokens);
    match tokens {
        ["in", rest @ ..] => decls.inputs.push(parse_variable(rest)?),
        ["uniform", name, "{", body @ ..] => {
            let close = body
                .iter()
                .position(|t| *t == "}")
                .ok_or_else(|| format!("'{name}' : unterminated block"))?;
            let members = body[..close]
                .split(|t| *t == ";")
                .filter(|m| !m.is_empty())
                .map(parse_variable)
                .collect::<Result<Vec<_>, _>>()?;
            decls.blocks.push(BlockDecl {
                name: (*name).to_owned(),
                binding,
                members,
            });
        }
        ["uniform", rest @ ..] => decls.uniforms.push(parse_variable(rest)?),
        _ => {}
    }
    Ok(())
}

fn scan(source: &str) -> Result<Declarations, String> {
    let mut decls = Declarations::default();
    let mut tokens: Vec<&str> = Vec::new();
    let mut depth = 0u32;
    let mut defined: HashSet<&str> = HashSet::new();
    // One entry per open `#ifdef`/`#ifndef`: whether its branch is taken.
    let mut taken: Vec<bool> = Vec::new();

    for (number, raw) in source.lines().enumerate() {
        let line = raw.split("//").next().unwrap_or_default().trim();
        let active = taken.iter().all(|&t| t);

        if let Some(directive) = line.strip_prefix('#') {
            let directive = directive.trim_start();
            let mut words = directive.split_whitespace();
            let keyword = words.next().unwrap_or_default();
            let argument = words.next().unwrap_or_default();
            let message = directive[keyword.len()..].trim();
            match keyword {
                "ifdef" => taken.push(defined.contains(argument)),
                "ifndef" => taken.push(!defined.contains(argument)),
                "else" => {
                    if let Some(top) = taken.last_mut() {
                        *top = !*top;
                    }
                }
                "endif" => {
                    taken.pop();
                }
                _ if !active => {}
                "define" => {
                    defined.insert(argument);
                }
                "error" => {
                    return Err(format!("ERROR: 0:{}: '#error' : {message}", number + 1));
                }
                "link_error" => decls.link_error = Some(message.to_owned()),
                _ => {}
            }
            continue;
        }
        if !active {
            continue;
        }

        for token in tokenize(line) {
            match token {
                "{" => {
                    depth += 1;
                    tokens.push(token);
                }
                "}" => {
                    depth = depth.saturating_sub(1);
                    tokens.push(token);
                    // Function bodies end without a `;`; uniform blocks carry on to theirs.
                    if depth == 0 && strip_layout(&tokens).first() != Some(&"uniform") {
                        tokens.clear();
                    }
                }
                ";" if depth == 0 => {
                    parse_statement(&tokens, &mut decls)?;
                    tokens.clear();
                }
                _ => tokens.push(token),
            }
        }
    }

    Ok(decls)
}

#[derive(Debug)]
struct ShaderState {
    kind: u32,
    fragments: Vec<String>,
    compiled: Option<Result<Declarations, String>>,
}

#[derive(Debug, Clone)]
struct LinkedUniform {
    /// Name reported by `glGetActiveUniform`.
    active_name: String,
    base_name: String,
    gl_type: u32,
    size: u32,
    /// First element's location; `None` for block members.
    location: Option<u32>,
    /// Index of this entry within its array when elements are listed separately.
    element: u32,
}

#[derive(Debug, Clone)]
struct LinkedBlock {
    name: String,
    binding: u32,
    data_size: u32,
}

#[derive(Debug, Clone, Default)]
struct LinkedProgram {
    attributes: Vec<(VariableDecl, u32)>,
    uniforms: Vec<LinkedUniform>,
    blocks: Vec<LinkedBlock>,
    values: HashMap<u32, i32>,
}

#[derive(Debug, Default)]
struct ProgramState {
    attached: Vec<GlShader>,
    separable: bool,
    attrib_bindings: HashMap<String, u32>,
    linked: Option<LinkedProgram>,
    log: String,
}

/// In-process stand-in for a GL context. See the module docs.
#[derive(Debug)]
pub struct HeadlessGl {
    next_name: u32,
    shaders: HashMap<GlShader, ShaderState>,
    programs: HashMap<GlProgram, ProgramState>,
    max_uniform_buffer_bindings: u32,
    report_array_elements: bool,
    fail_allocations: bool,
    fail_next_link: bool,

    shaders_created: u64,
    programs_created: u64,
    compile_calls: u64,
    link_calls: u64,
    invalid_deletes: u64,
}

impl Default for HeadlessGl {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessGl {
    pub fn new() -> Self {
        Self {
            next_name: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            max_uniform_buffer_bindings: DEFAULT_MAX_UNIFORM_BUFFER_BINDINGS,
            report_array_elements: false,
            fail_allocations: false,
            fail_next_link: false,
            shaders_created: 0,
            programs_created: 0,
            compile_calls: 0,
            link_calls: 0,
            invalid_deletes: 0,
        }
    }

    pub fn set_max_uniform_buffer_bindings(&mut self, max: u32) {
        self.max_uniform_buffer_bindings = max;
    }

    /// List `name[1]`, `name[2]`, ... as separate active uniforms, as some drivers do.
    pub fn report_array_elements(&mut self, enabled: bool) {
        self.report_array_elements = enabled;
    }

    /// Make every `create_*` call fail.
    pub fn fail_allocations(&mut self, enabled: bool) {
        self.fail_allocations = enabled;
    }

    pub fn fail_next_link(&mut self) {
        self.fail_next_link = true;
    }

    pub fn shaders_created(&self) -> u64 {
        self.shaders_created
    }

    pub fn programs_created(&self) -> u64 {
        self.programs_created
    }

    pub fn compile_calls(&self) -> u64 {
        self.compile_calls
    }

    pub fn link_calls(&self) -> u64 {
        self.link_calls
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Deletes of names that were never created or already deleted.
    pub fn invalid_deletes(&self) -> u64 {
        self.invalid_deletes
    }

    /// Source strings submitted for `shader`, in order.
    pub fn shader_fragments(&self, shader: GlShader) -> Option<Vec<String>> {
        self.shaders.get(&shader).map(|s| s.fragments.clone())
    }

    pub fn is_separable(&self, program: GlProgram) -> bool {
        self.programs.get(&program).is_some_and(|p| p.separable)
    }

    fn allocate(&mut self) -> Option<NonZeroU32> {
        if self.fail_allocations {
            return None;
        }
        let name = NonZeroU32::new(self.next_name)?;
        self.next_name = self.next_name.checked_add(1)?;
        Some(name)
    }

    fn linked(&self, program: GlProgram) -> Option<&LinkedProgram> {
        self.programs.get(&program)?.linked.as_ref()
    }

    fn linked_mut(&mut self, program: GlProgram) -> Option<&mut LinkedProgram> {
        self.programs.get_mut(&program)?.linked.as_mut()
    }

    fn link(&self, state: &ProgramState) -> Result<LinkedProgram, String> {
        let mut stages = Vec::with_capacity(state.attached.len());
        for shader in &state.attached {
            let Some(shader_state) = self.shaders.get(shader) else {
                return Err(format!("attached shader {} does not exist", shader.0));
            };
            match &shader_state.compiled {
                Some(Ok(decls)) => stages.push((shader_state.kind, decls)),
                _ => return Err(format!("attached shader {} is not compiled", shader.0)),
            }
        }
        if stages.is_empty() {
            return Err("no shaders attached".to_owned());
        }
        if let Some(message) = stages.iter().find_map(|(_, d)| d.link_error.as_deref()) {
            return Err(format!("error: {message}"));
        }

        let mut linked = LinkedProgram::default();

        // Attributes: explicit bindings first, the rest fill the lowest free locations.
        let inputs: Vec<&VariableDecl> = stages
            .iter()
            .filter(|(kind, _)| *kind == gl::VERTEX_SHADER)
            .flat_map(|&(_, d)| d.inputs.iter())
            .collect();
        let mut used: HashSet<u32> = inputs
            .iter()
            .filter_map(|i| state.attrib_bindings.get(&i.name).copied())
            .collect();
        for input in inputs {
            let location = match state.attrib_bindings.get(&input.name) {
                Some(&bound) => bound,
                None => {
                    let free = (0..MAX_VERTEX_ATTRIBS)
                        .find(|l| !used.contains(l))
                        .ok_or_else(|| "too many vertex attributes".to_owned())?;
                    used.insert(free);
                    free
                }
            };
            linked.attributes.push((input.clone(), location));
        }

        let mut next_location = 0u32;
        let mut seen = HashSet::new();
        for (_, decls) in &stages {
            for uniform in &decls.uniforms {
                if !seen.insert(uniform.name.clone()) {
                    continue;
                }
                let location = next_location;
                next_location += uniform.size;
                let is_array = uniform.size > 1;
                let active_name = if is_array {
                    format!("{}[0]", uniform.name)
                } else {
                    uniform.name.clone()
                };
                linked.uniforms.push(LinkedUniform {
                    active_name,
                    base_name: uniform.name.clone(),
                    gl_type: uniform.gl_type,
                    size: uniform.size,
                    location: Some(location),
                    element: 0,
                });
                if is_array && self.report_array_elements {
                    for element in 1..uniform.size {
                        linked.uniforms.push(LinkedUniform {
                            active_name: format!("{}[{element}]", uniform.name),
                            base_name: uniform.name.clone(),
                            gl_type: uniform.gl_type,
                            size: 1,
                            location: Some(location),
                            element,
                        });
                    }
                }
            }
            for block in &decls.blocks {
                if !seen.insert(block.name.clone()) {
                    continue;
                }
                for member in &block.members {
                    linked.uniforms.push(LinkedUniform {
                        active_name: member.name.clone(),
                        base_name: member.name.clone(),
                        gl_type: member.gl_type,
                        size: member.size,
                        location: None,
                        element: 0,
                    });
                }
                linked.blocks.push(LinkedBlock {
                    name: block.name.clone(),
                    binding: block.binding.unwrap_or(0),
                    data_size: block
                        .members
                        .iter()
                        .map(|m| std140_size(m.gl_type) * m.size)
                        .sum(),
                });
            }
        }

        Ok(linked)
    }
}

impl GlDriver for HeadlessGl {
    fn create_shader(&mut self, kind: u32) -> Option<GlShader> {
        if !matches!(
            kind,
            gl::VERTEX_SHADER | gl::FRAGMENT_SHADER | gl::GEOMETRY_SHADER
        ) {
            return None;
        }
        let shader = GlShader(self.allocate()?);
        self.shaders.insert(
            shader,
            ShaderState {
                kind,
                fragments: Vec::new(),
                compiled: None,
            },
        );
        self.shaders_created += 1;
        Some(shader)
    }

    fn shader_source(&mut self, shader: GlShader, fragments: &[&str]) {
        if let Some(state) = self.shaders.get_mut(&shader) {
            state.fragments = fragments.iter().map(|f| (*f).to_owned()).collect();
        }
    }

    fn compile_shader(&mut self, shader: GlShader) {
        self.compile_calls += 1;
        if let Some(state) = self.shaders.get_mut(&shader) {
            state.compiled = Some(scan(&state.fragments.concat()));
        }
    }

    fn shader_compile_status(&self, shader: GlShader) -> bool {
        matches!(
            self.shaders.get(&shader).and_then(|s| s.compiled.as_ref()),
            Some(Ok(_))
        )
    }

    fn shader_info_log(&self, shader: GlShader) -> String {
        match self.shaders.get(&shader).and_then(|s| s.compiled.as_ref()) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: GlShader) {
        if self.shaders.remove(&shader).is_none() {
            self.invalid_deletes += 1;
        }
    }

    fn create_program(&mut self) -> Option<GlProgram> {
        let program = GlProgram(self.allocate()?);
        self.programs.insert(program, ProgramState::default());
        self.programs_created += 1;
        Some(program)
    }

    fn set_program_separable(&mut self, program: GlProgram) -> Result<(), GlError> {
        if let Some(state) = self.programs.get_mut(&program) {
            state.separable = true;
        }
        Ok(())
    }

    fn attach_shader(&mut self, program: GlProgram, shader: GlShader) {
        if let Some(state) = self.programs.get_mut(&program) {
            if !state.attached.contains(&shader) {
                state.attached.push(shader);
            }
        }
    }

    fn link_program(&mut self, program: GlProgram) {
        self.link_calls += 1;
        let Some(state) = self.programs.get(&program) else {
            return;
        };
        let result = if std::mem::take(&mut self.fail_next_link) {
            Err("error: injected link failure".to_owned())
        } else {
            self.link(state)
        };
        if let Some(state) = self.programs.get_mut(&program) {
            match result {
                Ok(linked) => {
                    state.linked = Some(linked);
                    state.log.clear();
                }
                Err(log) => {
                    state.linked = None;
                    state.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: GlProgram) -> bool {
        self.linked(program).is_some()
    }

    fn program_info_log(&self, program: GlProgram) -> String {
        self.programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: GlProgram) {
        if self.programs.remove(&program).is_none() {
            self.invalid_deletes += 1;
        }
    }

    fn attrib_location(&self, program: GlProgram, name: &str) -> Option<u32> {
        self.linked(program)?
            .attributes
            .iter()
            .find(|(decl, _)| decl.name == name)
            .map(|&(_, location)| location)
    }

    fn bind_attrib_location(&mut self, program: GlProgram, location: u32, name: &str) {
        if let Some(state) = self.programs.get_mut(&program) {
            state.attrib_bindings.insert(name.to_owned(), location);
        }
    }

    fn active_attribute_count(&self, program: GlProgram) -> u32 {
        self.linked(program)
            .map_or(0, |p| p.attributes.len() as u32)
    }

    fn active_attribute(&self, program: GlProgram, index: u32) -> Option<ActiveVariable> {
        let (decl, _) = self.linked(program)?.attributes.get(index as usize)?;
        Some(ActiveVariable {
            name: decl.name.clone(),
            size: decl.size as i32,
            gl_type: decl.gl_type,
        })
    }

    fn active_uniform_count(&self, program: GlProgram) -> u32 {
        self.linked(program).map_or(0, |p| p.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: GlProgram, index: u32) -> Option<ActiveVariable> {
        let uniform = self.linked(program)?.uniforms.get(index as usize)?;
        Some(ActiveVariable {
            name: uniform.active_name.clone(),
            size: uniform.size as i32,
            gl_type: uniform.gl_type,
        })
    }

    fn uniform_location(&self, program: GlProgram, name: &str) -> Option<u32> {
        let linked = self.linked(program)?;
        let (base, element) = match name.strip_suffix(']').and_then(|n| n.rsplit_once('[')) {
            Some((base, index)) => (base, index.parse::<u32>().ok()?),
            None => (name, 0),
        };
        linked
            .uniforms
            .iter()
            .filter(|u| u.element == 0)
            .find(|u| u.base_name == base && element < u.size)
            .and_then(|u| u.location)
            .map(|location| location + element)
    }

    fn uniform_i32(&self, program: GlProgram, location: u32) -> i32 {
        self.linked(program)
            .and_then(|p| p.values.get(&location).copied())
            .unwrap_or(0)
    }

    fn program_uniform_i32(&mut self, program: GlProgram, location: u32, value: i32) {
        if let Some(linked) = self.linked_mut(program) {
            linked.values.insert(location, value);
        }
    }

    fn max_uniform_buffer_bindings(&self) -> u32 {
        self.max_uniform_buffer_bindings
    }

    fn active_uniform_block_count(&self, program: GlProgram) -> u32 {
        self.linked(program).map_or(0, |p| p.blocks.len() as u32)
    }

    fn active_uniform_block(&self, program: GlProgram, index: u32) -> Option<ActiveUniformBlock> {
        let block = self.linked(program)?.blocks.get(index as usize)?;
        Some(ActiveUniformBlock {
            name: block.name.clone(),
            binding: block.binding,
            data_size: block.data_size,
        })
    }

    fn uniform_block_index(&self, program: GlProgram, name: &str) -> Option<u32> {
        self.linked(program)?
            .blocks
            .iter()
            .position(|b| b.name == name)
            .map(|i| i as u32)
    }

    fn uniform_block_binding(&mut self, program: GlProgram, block_index: u32, binding: u32) {
        if let Some(block) = self
            .linked_mut(program)
            .and_then(|p| p.blocks.get_mut(block_index as usize))
        {
            block.binding = binding;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenizer_splits_punctuation() {
        assert_eq!(
            tokenize("uniform vec4 foo[3];"),
            vec!["uniform", "vec4", "foo", "[", "3", "]", ";"]
        );
        assert_eq!(
            tokenize("layout(location = 2) in vec3 n;"),
            vec!["layout", "(", "location", "=", "2", ")", "in", "vec3", "n", ";"]
        );
    }

    #[test]
    fn scan_collects_top_level_declarations() {
        let decls = scan(
            "#version 410 core\n\
             #define GPU_VERTEX_SHADER\n\
             layout(location = 2) in vec3 inNormal; // normal\n\
             uniform highp mat4 model;\n\
             uniform vec4 palette[4];\n\
             uniform cameraBuffer {\n    mat4 view;\n    vec4 eye;\n} camera;\n\
             void main() {\n    vec4 unused = vec4(1.0);\n}\n",
        )
        .unwrap();

        assert_eq!(decls.inputs.len(), 1);
        assert_eq!(decls.inputs[0].name, "inNormal");
        assert_eq!(decls.inputs[0].gl_type, gl::FLOAT_VEC3);

        let uniforms: Vec<_> = decls
            .uniforms
            .iter()
            .map(|u| (u.name.as_str(), u.gl_type, u.size))
            .collect();
        assert_eq!(
            uniforms,
            vec![("model", gl::FLOAT_MAT4, 1), ("palette", gl::FLOAT_VEC4, 4)]
        );

        assert_eq!(decls.blocks.len(), 1);
        assert_eq!(decls.blocks[0].name, "cameraBuffer");
        assert_eq!(decls.blocks[0].members.len(), 2);
    }

    #[test]
    fn layout_binding_sets_the_initial_block_binding() {
        let decls = scan(
            "layout(std140, binding = 5) uniform lights {\n    vec4 color;\n};\n\
             uniform plain { vec4 x; };\n",
        )
        .unwrap();

        let blocks: Vec<_> = decls
            .blocks
            .iter()
            .map(|b| (b.name.as_str(), b.binding))
            .collect();
        assert_eq!(blocks, vec![("lights", Some(5)), ("plain", None)]);
    }

    #[test]
    fn conditionals_follow_defines() {
        let source = "#define STEREO\n\
                      #ifdef STEREO\n\
                      uniform int eyeIndex;\n\
                      #else\n\
                      uniform vec4 monoTint;\n\
                      #error not reached\n\
                      #endif\n\
                      #ifndef GPU_PIXEL_SHADER\n\
                      in vec4 inPosition;\n\
                      #endif\n";
        let decls = scan(source).unwrap();
        let names: Vec<_> = decls.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["eyeIndex"]);
        assert_eq!(decls.inputs.len(), 1);
    }

    #[test]
    fn unknown_types_fail_compilation() {
        let err = scan("uniform widget w;\n").unwrap_err();
        assert!(err.contains("'widget' : undeclared type"), "{err}");
    }

    #[test]
    fn error_directive_reports_its_line() {
        let err = scan("void main() {}\n#error stop here\n").unwrap_err();
        assert_eq!(err, "ERROR: 0:2: '#error' : stop here");
    }

    #[test]
    fn bound_attribute_locations_apply_at_next_link() {
        let mut gl = HeadlessGl::new();
        let vs = gl.create_shader(gl::VERTEX_SHADER).unwrap();
        gl.shader_source(vs, &["in vec4 a;\nin vec4 b;\n"]);
        gl.compile_shader(vs);
        let p = gl.create_program().unwrap();
        gl.attach_shader(p, vs);
        gl.link_program(p);
        assert_eq!(gl.attrib_location(p, "a"), Some(0));
        assert_eq!(gl.attrib_location(p, "b"), Some(1));

        gl.bind_attrib_location(p, 0, "b");
        assert_eq!(gl.attrib_location(p, "b"), Some(1));
        gl.link_program(p);
        assert_eq!(gl.attrib_location(p, "b"), Some(0));
        assert_eq!(gl.attrib_location(p, "a"), Some(1));
    }

    #[test]
    fn array_uniform_locations_cover_every_element() {
        let mut gl = HeadlessGl::new();
        let fs = gl.create_shader(gl::FRAGMENT_SHADER).unwrap();
        gl.shader_source(fs, &["uniform float w[3];\nuniform float k;\n"]);
        gl.compile_shader(fs);
        let p = gl.create_program().unwrap();
        gl.attach_shader(p, fs);
        gl.link_program(p);

        assert_eq!(gl.uniform_location(p, "w"), Some(0));
        assert_eq!(gl.uniform_location(p, "w[0]"), Some(0));
        assert_eq!(gl.uniform_location(p, "w[2]"), Some(2));
        assert_eq!(gl.uniform_location(p, "w[3]"), None);
        assert_eq!(gl.uniform_location(p, "k"), Some(3));
        assert_eq!(gl.active_uniform_count(p), 2);
        assert_eq!(gl.active_uniform(p, 0).unwrap().name, "w[0]");
    }

    #[test]
    fn deleting_twice_is_counted() {
        let mut gl = HeadlessGl::new();
        let vs = gl.create_shader(gl::VERTEX_SHADER).unwrap();
        gl.delete_shader(vs);
        gl.delete_shader(vs);
        assert_eq!(gl.invalid_deletes(), 1);
    }
}
