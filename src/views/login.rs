use crate::views::layout::{render_layout, render_notices};

pub fn render_login_page(message: Option<&str>) -> String {
    let notices: Vec<&str> = message.into_iter().collect();
    let content = format!(
        r#"<div class="row justify-content-center">
          <div class="col-md-5 col-lg-4">
            <div class="card card-body">
              <h1 class="h4 mb-3">Sign in</h1>
              {notices}
              <form method="post" action="/">
                <div class="mb-3">
                  <label class="form-label" for="username">Username</label>
                  <input class="form-control" id="username" name="username" autocomplete="username" required autofocus>
                </div>
                <div class="mb-3">
                  <label class="form-label" for="password">Password</label>
                  <input class="form-control" id="password" name="password" type="password" autocomplete="current-password" required>
                </div>
                <button class="btn btn-primary w-100" type="submit">Login</button>
              </form>
            </div>
          </div>
        </div>"#,
        notices = render_notices(&notices),
    );

    render_layout("arkdash Login", "login", None, Vec::new(), &content)
}
