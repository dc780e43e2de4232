pub fn health_html() -> &'static str {
    r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>arkdash health</title>
    <link href="/web/css/theme.css" rel="stylesheet">
  </head>
  <body>
    <main class="container py-4">
      <h1>arkdash</h1>
      <p>Status: ok</p>
      <p><a href="/">Sign in</a></p>
    </main>
  </body>
</html>
"#
}
