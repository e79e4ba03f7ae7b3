// src/reload/snippet.rs

/// A `<script>` tag that connects a page to the reload server on `port`.
///
/// `reload` messages reload the page; `css` messages re-fetch every
/// stylesheet whose URL ends with the changed file's name.
pub fn client_snippet(port: u16) -> String {
    format!(
        r#"<script>
(function () {{
  var ws = new WebSocket("ws://" + (location.hostname || "127.0.0.1") + ":{port}");
  ws.onmessage = function (event) {{
    var msg = JSON.parse(event.data);
    if (msg.type === "reload") {{
      location.reload();
    }} else if (msg.type === "css") {{
      var name = msg.path.split("/").pop();
      document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {{
        var href = link.href.split("?")[0];
        if (href.slice(-name.length) === name) {{
          link.href = href + "?v=" + Date.now();
        }}
      }});
    }}
  }};
}})();
</script>"#
    )
}
