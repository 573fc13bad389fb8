//! Loader script generation.
//!
//! Every loader starts with the same header block, followed by the body of
//! one dialect:
//!
//! ```text
//! // JavaScript file loader for split chunks
//! // Original file: frontend/app.js
//! // Split into 5 chunks
//!
//! <dialect body>
//! ```

use std::fmt::Write;

use super::LoaderDialect;

/// Milliseconds between two sequential chunk loads.
const CHUNK_DELAY_MS: u32 = 10;

/// Writes the body of one loader dialect.
pub trait RenderLoader {
    /// `chunk_urls` are in load order, one per chunk.
    fn render(&self, out: &mut Js, chunk_urls: &[String]);
}

/// Text buffer with an indentation prefix applied to each line.
#[derive(Debug, Default)]
pub struct Js {
    buf: String,
    indent: usize,
}

impl Js {
    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.buf.push(' ');
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn indented(&mut self, by: usize, f: impl FnOnce(&mut Self)) {
        self.indent += by;
        f(self);
        self.indent -= by;
    }

    fn push_chunks(&mut self, array: &str, chunk_urls: &[String]) {
        for url in chunk_urls {
            self.line(&format!("{array}.push({});", js_string(url)));
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Render the full loader text for `original` split into `chunk_urls`.
pub fn render_loader(dialect: LoaderDialect, original: &str, chunk_urls: &[String]) -> String {
    let mut out = Js::default();
    out.line("// JavaScript file loader for split chunks");
    out.line(&format!("// Original file: {original}"));
    out.line(&format!("// Split into {} chunks", chunk_urls.len()));
    out.line("");

    let renderer: &dyn RenderLoader = match dialect {
        LoaderDialect::SelfLoader => &SelfLoader,
        LoaderDialect::ModuleAware => &ModuleAwareLoader,
        LoaderDialect::Plain => &PlainLoader,
    };
    renderer.render(&mut out, chunk_urls);
    out.finish()
}

// ============================================================================
// Dialects
// ============================================================================

/// Prefetches every chunk, then executes the concatenation once.
pub struct SelfLoader;

impl RenderLoader for SelfLoader {
    fn render(&self, out: &mut Js, chunk_urls: &[String]) {
        out.line("// Module loader runtime, prefetched in parallel");
        out.line("(function() {");
        out.indented(4, |out| {
            out.line("var loadStart = new Date().getTime();");
            out.line("var chunks = [];");
            out.push_chunks("chunks", chunk_urls);
            out.line("var loadedChunks = 0;");
            out.line("var chunkContents = [];");
            out.line("");
            out.line("chunks.forEach(function(chunk, index) {");
            out.line("    fetch(chunk)");
            out.line("        .then(function(response) { return response.text(); })");
            out.line("        .then(function(code) {");
            out.line("            chunkContents[index] = code;");
            out.line("            loadedChunks++;");
            out.line("            if (loadedChunks === chunks.length) {");
            out.line("                executeAllChunks();");
            out.line("            }");
            out.line("        });");
            out.line("});");
            out.line("");
            out.line("function executeAllChunks() {");
            out.line("    try {");
            out.line("        var scriptElement = document.createElement('script');");
            out.line("        scriptElement.textContent = chunkContents.join('');");
            out.line("        document.head.appendChild(scriptElement);");
            out.line("        var totalTime = new Date().getTime() - loadStart;");
            out.line("        console.log('Chunked loader: executed in ' + totalTime + 'ms');");
            out.line("    } catch (e) {");
            out.line("        console.error('Error executing chunks:', e);");
            out.line("        loadFallback();");
            out.line("    }");
            out.line("}");
            out.line("");
            out.line("function loadFallback() {");
            out.line("    var script = document.createElement('script');");
            out.line("    script.src = chunks[0];");
            out.line("    document.head.appendChild(script);");
            out.line("}");
        });
        out.line("})();");
    }
}

/// Sequential loads through the module runtime when present.
pub struct ModuleAwareLoader;

impl RenderLoader for ModuleAwareLoader {
    fn render(&self, out: &mut Js, chunk_urls: &[String]) {
        out.line("// Module-aware loader");
        out.line("if (typeof define === 'function' && define.amd) {");
        out.indented(4, |out| {
            out.line("var chunkPaths = [];");
            out.push_chunks("chunkPaths", chunk_urls);
            out.line("");
            out.line("define(['require'], function(require) {");
            out.line("    var loadChunk = function(index) {");
            out.line("        if (index >= chunkPaths.length) return;");
            out.line("        require([chunkPaths[index]], function() {");
            out.line(&format!(
                "            setTimeout(function() {{ loadChunk(index + 1); }}, {CHUNK_DELAY_MS});"
            ));
            out.line("        });");
            out.line("    };");
            out.line("    loadChunk(0);");
            out.line("});");
        });
        out.line("} else {");
        out.indented(4, |out| PlainLoader.render(out, chunk_urls));
        out.line("}");
    }
}

/// Appends one `<script>` per chunk, each after the previous loaded.
pub struct PlainLoader;

impl RenderLoader for PlainLoader {
    fn render(&self, out: &mut Js, chunk_urls: &[String]) {
        out.line("// Standard loader");
        out.line("(function() {");
        out.indented(4, |out| {
            out.line("var chunks = [];");
            out.push_chunks("chunks", chunk_urls);
            out.line("");
            out.line("var loadChunk = function(index) {");
            out.line("    if (index >= chunks.length) return;");
            out.line("    var script = document.createElement('script');");
            out.line("    script.src = chunks[index];");
            out.line("    script.onload = function() {");
            out.line(&format!(
                "        setTimeout(function() {{ loadChunk(index + 1); }}, {CHUNK_DELAY_MS});"
            ));
            out.line("    };");
            out.line("    document.head.appendChild(script);");
            out.line("};");
            out.line("loadChunk(0);");
        });
        out.line("})();");
    }
}

/// Single-quoted JavaScript string literal.
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\x3c"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
