use shaderlab_shared::uniforms::DEFAULT_PARTICLE_RESOLUTION;

/// Vertices drawn per particle when the vertex slot names no count.
pub const DEFAULT_VERTEX_COUNT: i32 = 1;

/// Particle framebuffer resolution requested by `#pragma size W H`.
///
/// The last well-formed pragma wins. Non-positive values fall back to the default.
pub fn particle_resolution(source: &str) -> [i32; 2] {
    let mut size = [DEFAULT_PARTICLE_RESOLUTION; 2];
    for args in pragma_args(source, "size") {
        if let [w, h, ..] = args.as_slice() {
            if let (Ok(w), Ok(h)) = (w.parse::<i32>(), h.parse::<i32>()) {
                size = if w > 0 && h > 0 {
                    [w, h]
                } else {
                    [DEFAULT_PARTICLE_RESOLUTION; 2]
                };
            }
        }
    }
    size
}

/// Vertex count requested by `#pragma vertexCount N`.
pub fn vertex_count(source: &str) -> i32 {
    let mut count = DEFAULT_VERTEX_COUNT;
    for args in pragma_args(source, "vertexCount") {
        if let Some(Ok(n)) = args.first().map(|n| n.parse::<i32>()) {
            count = if n > 0 { n } else { DEFAULT_VERTEX_COUNT };
        }
    }
    count
}

/// Arguments of every `#pragma <name> ...` line, one vector per line.
fn pragma_args<'a>(source: &'a str, name: &'a str) -> impl Iterator<Item = Vec<&'a str>> + 'a {
    source.lines().filter_map(move |line| {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some("#pragma"), Some(n)) if n == name => Some(tokens.collect()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_pragma_parsed() {
        let src = "precision highp float;\n#pragma size 64 32\nvoid main() {}";
        assert_eq!(particle_resolution(src), [64, 32]);
    }

    #[test]
    fn test_size_pragma_tolerates_extra_whitespace() {
        assert_eq!(particle_resolution("  #pragma\tsize   128    16  "), [128, 16]);
    }

    #[test]
    fn test_size_defaults_when_absent_or_non_positive() {
        assert_eq!(particle_resolution("void main() {}"), [256, 256]);
        assert_eq!(particle_resolution("#pragma size 0 64"), [256, 256]);
        assert_eq!(particle_resolution("#pragma size 64 -1"), [256, 256]);
    }

    #[test]
    fn test_malformed_size_is_ignored() {
        assert_eq!(particle_resolution("#pragma size wide 64"), [256, 256]);
        assert_eq!(particle_resolution("#pragma size 64"), [256, 256]);
    }

    #[test]
    fn test_vertex_count_pragma() {
        assert_eq!(vertex_count("#pragma vertexCount 6"), 6);
        assert_eq!(vertex_count("#pragma vertexCount 0"), DEFAULT_VERTEX_COUNT);
        assert_eq!(vertex_count("// #pragma vertexCount 6"), DEFAULT_VERTEX_COUNT);
    }

    #[test]
    fn test_other_pragmas_do_not_match() {
        assert_eq!(vertex_count("#pragma size 6 6"), DEFAULT_VERTEX_COUNT);
        assert_eq!(particle_resolution("#pragma vertexCount 6"), [256, 256]);
    }
}
