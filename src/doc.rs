//! API documentation generated from route schemas.
//!
//! Every route answers a sibling `…/doc` path with a page describing itself
//! and all of its descendants: path, description, and the rendered input and
//! output [`Checker`]s. The page is assembled as a [`DocPage`] first and only
//! turned into HTML (or text) at the end.

use minijinja::Environment;
use serde::Serialize;

use crate::checker::Checker;
use crate::router::Route;

/// Reading guide printed at the top of every page.
pub const LEGEND: &str = "\
#STATUS         status returned when the value is rejected
<NOTE>          notes on the value, never checked

string          any string
string(n)       a string of exactly n bytes
string[m,n]     a string of at least m and at most n bytes
string{a,b,c}   one of the strings a, b, c
int             any integer
int(n)          the integer n
int[m,n]        an integer no less than m and no greater than n
int{a,b,c}      one of the integers a, b, c
mobile          an 11 byte phone number
md5             a 32 or 64 byte digest

[m,n]           an empty or negative bound is open on that side
a|b             either rule a or rule b
[x,...]         an array whose elements all match x
";

const TEMPLATE: &str = r#"<!doctype html>
<title>{{ title }}</title>
<h1>{{ title }}</h1>
<pre>{{ legend }}</pre>
{%- for block in blocks %}
<hr>
<p><a href="{{ block.doc_path }}" title="click to see sub tree">@path:</a> {{ block.path }}</p>
{%- if block.description %}
<p>{{ block.description }}</p>
{%- endif %}
{%- if block.input %}
<p>:- input</p>
<pre>{{ block.input }}</pre>
{%- endif %}
{%- if block.output %}
<p>:- output</p>
<pre>{{ block.output }}</pre>
{%- endif %}
{%- endfor %}
<hr><p>@generated by reef</p>
"#;

/// Documentation attached to a route at registration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Doc {
    pub(crate) path: String,
    pub(crate) doc_path: String,
    pub(crate) description: String,
    pub(crate) input: Option<Checker>,
    pub(crate) output: Option<Checker>,
}

impl Doc {
    pub fn path(&self) -> &str { &self.path }
    pub fn doc_path(&self) -> &str { &self.doc_path }
    pub fn description(&self) -> &str { &self.description }
    pub fn input(&self) -> Option<&Checker> { self.input.as_ref() }
    pub fn output(&self) -> Option<&Checker> { self.output.as_ref() }

    pub fn block(&self) -> DocBlock {
        let render = |c: &Checker| format!("{{\n{}}}", c.render("\t"));
        DocBlock {
            path: self.path.clone(),
            doc_path: self.doc_path.clone(),
            description: self.description.clone(),
            input: self.input.as_ref().map(render),
            output: self.output.as_ref().map(render),
        }
    }
}

/// One route's section of a page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocBlock {
    pub path: String,
    pub doc_path: String,
    pub description: String,
    pub input: Option<String>,
    pub output: Option<String>,
}

/// A whole documentation page: the legend plus one block per route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocPage {
    pub title: String,
    pub legend: &'static str,
    pub blocks: Vec<DocBlock>,
}

impl DocPage {
    /// HTML with every interpolated value escaped.
    pub fn to_html(&self) -> Result<String, minijinja::Error> {
        let mut env = Environment::new();
        // The `.html` suffix turns on auto-escaping.
        env.add_template("doc.html", TEMPLATE)?;
        env.get_template("doc.html")?.render(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n\n{}", self.title, self.legend);
        for block in &self.blocks {
            out.push_str(&format!("\n@path: {}\n", block.path));
            if !block.description.is_empty() {
                out.push_str(&block.description);
                out.push('\n');
            }
            if let Some(input) = &block.input {
                out.push_str(&format!(":- input\n{input}\n"));
            }
            if let Some(output) = &block.output {
                out.push_str(&format!(":- output\n{output}\n"));
            }
        }
        out
    }
}

/// Documents `root` and its descendants, in registration order.
pub fn render_tree(root: &Route) -> DocPage {
    let mut blocks = Vec::new();
    collect(root, &mut blocks);
    DocPage { title: "api doc".to_owned(), legend: LEGEND, blocks }
}

fn collect(route: &Route, out: &mut Vec<DocBlock>) {
    out.push(route.doc().block());
    for child in route.children() {
        collect(child, out);
    }
}
