//! Template engine setup and HTML templates.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use pasteboard_types::models::{Comment, Paste};
use serde::Serialize;
use tera::{Context, Tera};

/// Timestamp format shown on pages and in the sitemap.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Global template engine instance with embedded templates.
pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    // The sitemap escapes its own values with `escape_xml`
    tera.autoescape_on(vec![".html"]);

    // Embed templates directly in the binary (no external files needed)
    tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("home.html", HOME_TEMPLATE),
        ("show_paste.html", SHOW_PASTE_TEMPLATE),
        ("delete_paste.html", DELETE_PASTE_TEMPLATE),
        ("diff.html", DIFF_TEMPLATE),
        ("my_pastes.html", MY_PASTES_TEMPLATE),
        ("archive.html", ARCHIVE_TEMPLATE),
        ("login.html", LOGIN_TEMPLATE),
        ("signup.html", SIGNUP_TEMPLATE),
        ("about.html", ABOUT_TEMPLATE),
        ("feedback.html", FEEDBACK_TEMPLATE),
        ("error.html", ERROR_TEMPLATE),
        ("sitemap.xml", SITEMAP_TEMPLATE),
        ("robots.txt", ROBOTS_TEMPLATE),
    ])
    .expect("Failed to load templates");

    tera
});

/// Render a template with context
pub fn render(template: &str, context: &Context) -> Result<String, tera::Error> {
    TEMPLATES.render(template, context)
}

pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format(DISPLAY_TIME_FORMAT).to_string()
}

/// A paste plus the derived strings templates need.
#[derive(Serialize)]
pub struct PasteView {
    #[serde(flatten)]
    pub paste: Paste,
    pub display_title: String,
    pub created: String,
}

impl From<Paste> for PasteView {
    fn from(paste: Paste) -> Self {
        PasteView {
            display_title: paste.display_title(),
            created: format_time(&paste.created_at),
            paste,
        }
    }
}

#[derive(Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub created: String,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        CommentView {
            created: format_time(&comment.created_at),
            comment,
        }
    }
}

// =============================================================================
// Embedded Templates
// =============================================================================

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}Pasteboard{% endblock %}</title>
    <style>
        * { box-sizing: border-box; }
        body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; color: #1f2328; background: #f6f8fa; }
        a { color: #0969da; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .header { background: #24292f; padding: 12px 32px; display: flex; gap: 20px; align-items: center; }
        .header a { color: #f6f8fa; }
        .header .brand { font-weight: 600; margin-right: auto; }
        main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
        .flash { padding: 8px 12px; border-radius: 6px; margin-bottom: 12px; background: #ddf4ff; border: 1px solid #54aeff; }
        .flash.error { background: #ffebe9; border-color: #ff8182; }
        .field-error { color: #cf222e; font-size: 0.9em; }
        pre.code { background: #fff; border: 1px solid #d0d7de; border-radius: 6px; padding: 12px; overflow-x: auto; }
        textarea { width: 100%; min-height: 320px; font-family: ui-monospace, monospace; }
        input[type=text], input[type=email], input[type=password] { width: 100%; max-width: 420px; padding: 6px; }
        .muted { color: #57606a; }
        .comment { border-top: 1px solid #d0d7de; padding: 8px 0; }
        .diff-added { color: #116329; background: #dafbe1; }
        .diff-removed { color: #82071e; background: #ffebe9; }
        .diff-hunk { color: #0550ae; }
        .diff-header { font-weight: 600; }
        table { border-collapse: collapse; width: 100%; }
        td, th { text-align: left; padding: 6px 8px; border-bottom: 1px solid #d0d7de; }
    </style>
</head>
<body>
    <nav class="header">
        <a class="brand" href="/">Pasteboard</a>
        <a href="/archive">Archive</a>
        <a href="/about">About</a>
        {% if current_user %}
        <a href="/my_pastes">My pastes ({{ current_user }})</a>
        <a href="/logout">Log out</a>
        {% else %}
        <a href="/login">Log in</a>
        <a href="/signup">Sign up</a>
        {% endif %}
    </nav>
    <main>
        {% if flashes %}
        {% for flash in flashes %}
        <div class="flash {{ flash.category }}">{{ flash.message }}</div>
        {% endfor %}
        {% endif %}
        {% block content %}{% endblock %}
    </main>
</body>
</html>
"##;

const HOME_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}New paste · Pasteboard{% endblock %}
{% block content %}
{% if recent_paste %}
<p class="muted">Your latest paste: <a href="/{{ recent_paste.external_id }}">{{ recent_paste.display_title }}</a> ({{ recent_paste.created }})</p>
{% endif %}
<h1>{% if reply_to_title %}{{ reply_to_title }}{% else %}New paste{% endif %}</h1>
{% if reply_to %}
<p class="muted">Replying to <a href="/{{ reply_to.external_id }}">{{ reply_to.display_title }}</a>. Edit the text below.</p>
{% endif %}
<form method="post" action="/">
    <input type="hidden" name="reply_to" value="{% if reply_to %}{{ reply_to.id }}{% endif %}">
    <p><input type="text" name="title" placeholder="Title (optional)" value="{{ title }}"></p>
    <p><textarea name="code">{% if reply_to %}{{ reply_to.code }}{% else %}{{ code }}{% endif %}</textarea></p>
    <p>
        <select name="visibility">
            <option value="public">Public (listed in the archive)</option>
            <option value="secret"{% if visibility == "secret" %} selected{% endif %}>Secret (link only)</option>
        </select>
        <button type="submit">Paste</button>
    </p>
</form>
{% endblock %}
"##;

const SHOW_PASTE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ paste.display_title }} · Pasteboard{% endblock %}
{% block content %}
<h1>{{ paste.display_title }}</h1>
<p class="muted">
    #{{ paste.id }} by {% if paste.author_name %}{{ paste.author_name }}{% else %}anonymous{% endif %}
    on {{ paste.created }}{% if not paste.listed %} · secret{% endif %}
</p>
{% if parent %}
<p>In reply to <a href="/{{ parent.external_id }}">{{ parent.display_title }}</a>
 · <a href="/diff?paste1={{ parent.external_id }}&amp;paste2={{ paste.external_id }}">diff</a></p>
{% endif %}
<p>
    <a href="/{{ paste.external_id }}/raw">raw</a>
    · <a href="/?reply_to={{ paste.id }}">reply</a>
    {% if can_delete %}· <a href="/{{ paste.id }}/delete">delete</a>{% endif %}
</p>
<pre class="code">{{ paste.code }}</pre>
{% if replies %}
<h3>Replies</h3>
<ul>
    {% for reply in replies %}
    <li><a href="/{{ reply.external_id }}">{{ reply.display_title }}</a> ({{ reply.created }})
     · <a href="/diff?paste1={{ paste.external_id }}&amp;paste2={{ reply.external_id }}">diff</a></li>
    {% endfor %}
</ul>
{% endif %}
<h3>Comments</h3>
{% if comments %}
{% for comment in comments %}
<div class="comment">
    <strong>{{ comment.author_name }}</strong> <span class="muted">{{ comment.created }}</span>
    <div>{{ comment.message }}</div>
</div>
{% endfor %}
{% else %}
<p class="muted">No comments yet.</p>
{% endif %}
<form method="post" action="/{{ paste.external_id }}">
    <p><textarea name="comment" style="min-height: 80px"></textarea></p>
    <p><button type="submit">Comment</button>{% if not current_user %} <span class="muted">(log in to comment)</span>{% endif %}</p>
</form>
{% endblock %}
"##;

const DELETE_PASTE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Delete {{ paste.display_title }} · Pasteboard{% endblock %}
{% block content %}
<h1>Delete {{ paste.display_title }}?</h1>
<p>This removes the paste and all of its comments.</p>
<form method="post" action="/{{ paste.id }}/delete">
    <button type="submit" name="yes" value="yes">Yes, delete it</button>
    <button type="submit" name="no" value="no">No, keep it</button>
</form>
<pre class="code">{{ paste.code }}</pre>
{% endblock %}
"##;

const DIFF_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Diff · Pasteboard{% endblock %}
{% block content %}
<h1>Diff</h1>
<p>
    From <a href="/{{ frompaste.external_id }}">{{ frompaste.display_title }}</a>
    to <a href="/{{ to.external_id }}">{{ to.display_title }}</a>
</p>
{% if diff %}
<pre class="code">{% for line in diff %}<span class="diff-{{ line.kind }}">{{ line.text }}</span>
{% endfor %}</pre>
{% else %}
<p class="muted">The two pastes are identical.</p>
{% endif %}
{% endblock %}
"##;

const MY_PASTES_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}My pastes · Pasteboard{% endblock %}
{% block content %}
<h1>My pastes</h1>
{% if pastes %}
<table>
    <tr><th>Title</th><th>Created</th><th>Visibility</th></tr>
    {% for paste in pastes %}
    <tr>
        <td><a href="/{{ paste.external_id }}">{{ paste.display_title }}</a></td>
        <td>{{ paste.created }}</td>
        <td>{% if paste.listed %}public{% else %}secret{% endif %}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="muted">You have not pasted anything yet.</p>
{% endif %}
<h2>My comments</h2>
{% if comments %}
{% for comment in comments %}
<div class="comment">
    <a href="/{{ comment.paste_external_id }}">on paste #{{ comment.paste_id }}</a>
    <span class="muted">{{ comment.created }}</span>
    <div>{{ comment.message }}</div>
</div>
{% endfor %}
{% else %}
<p class="muted">No comments yet.</p>
{% endif %}
{% endblock %}
"##;

const ARCHIVE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Archive · Pasteboard{% endblock %}
{% block content %}
<h1>Archive</h1>
{% if pastes %}
<table>
    <tr><th>Title</th><th>Author</th><th>Created</th></tr>
    {% for paste in pastes %}
    <tr>
        <td><a href="/{{ paste.external_id }}">{{ paste.display_title }}</a></td>
        <td>{% if paste.author_name %}{{ paste.author_name }}{% else %}anonymous{% endif %}</td>
        <td>{{ paste.created }}</td>
    </tr>
    {% endfor %}
</table>
{% else %}
<p class="muted">Nothing here.</p>
{% endif %}
<p>
    {% if has_prev %}<a href="/archive/{{ page - 1 }}">&larr; newer</a>{% endif %}
    <span class="muted">page {{ page }} of {{ total_pages }}</span>
    {% if has_next %}<a href="/archive/{{ page + 1 }}">older &rarr;</a>{% endif %}
</p>
{% endblock %}
"##;

const LOGIN_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Log in · Pasteboard{% endblock %}
{% block content %}
<h1>Log in</h1>
<form method="post" action="/login">
    <p><label>Email<br><input type="email" name="email" value="{{ email }}"></label></p>
    {% if errors.email %}{% for e in errors.email %}<p class="field-error">{{ e }}</p>{% endfor %}{% endif %}
    <p><label>Password<br><input type="password" name="password"></label></p>
    {% if errors.password %}{% for e in errors.password %}<p class="field-error">{{ e }}</p>{% endfor %}{% endif %}
    <p><button type="submit">Log in</button></p>
</form>
<p class="muted">No account? <a href="/signup">Sign up</a>.</p>
{% endblock %}
"##;

const SIGNUP_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Sign up · Pasteboard{% endblock %}
{% block content %}
<h1>Sign up</h1>
<form method="post" action="/signup">
    <p><label>Name<br><input type="text" name="name" value="{{ name }}"></label></p>
    {% if errors.name %}{% for e in errors.name %}<p class="field-error">{{ e }}</p>{% endfor %}{% endif %}
    <p><label>Email<br><input type="email" name="email" value="{{ email }}"></label></p>
    {% if errors.email %}{% for e in errors.email %}<p class="field-error">{{ e }}</p>{% endfor %}{% endif %}
    <p><label>Password<br><input type="password" name="password"></label></p>
    {% if errors.password %}{% for e in errors.password %}<p class="field-error">{{ e }}</p>{% endfor %}{% endif %}
    <p><label>Repeat password<br><input type="password" name="confirm"></label></p>
    <p><button type="submit">Sign up</button></p>
</form>
{% endblock %}
"##;

const ABOUT_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}About · Pasteboard{% endblock %}
{% block content %}
<h1>About</h1>
<p>Pasteboard is a small place to share text. Paste something, send the link,
reply with a changed copy and compare the two with a diff.</p>
<p>Public pastes are listed in the <a href="/archive">archive</a>; secret ones are only
reachable through their link. Log in to comment and to delete your own pastes.</p>
<p>Found a problem? Leave <a href="/feedback">feedback</a>.</p>
{% endblock %}
"##;

const FEEDBACK_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Feedback · Pasteboard{% endblock %}
{% block content %}
<h1>Feedback</h1>
<p>Ideas, bugs and complaints are welcome. The quickest way to reach us is to
<a href="/">create a paste</a> describing the issue and comment on it.</p>
{% endblock %}
"##;

const ERROR_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ status }} · Pasteboard{% endblock %}
{% block content %}
<h1>{{ status }}</h1>
<p>{{ message }}</p>
<p><a href="/">Back home</a></p>
{% endblock %}
"##;

const SITEMAP_TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{% for page in pages %}  <url>
    <loc>{{ page.loc | escape_xml }}</loc>
    <lastmod>{{ page.lastmod | escape_xml }}</lastmod>
  </url>
{% endfor %}</urlset>
"##;

const ROBOTS_TEMPLATE: &str = r##"User-agent: *
Disallow: /my_pastes
Disallow: /login
Disallow: /signup
Disallow: /logout
Disallow: /diff
Sitemap: {{ url_root }}/sitemap.xml
"##;
