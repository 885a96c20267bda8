use ar_core::TouchPoints;
use glam::Vec2;
use web_sys as web;

/// Maps a client-space position into the canvas backing store, the same
/// space the renderer works in. Falls back to client space for a collapsed
/// canvas rect.
#[inline]
pub fn client_to_canvas_px(client: Vec2, rect: [f32; 4], backing: [u32; 2]) -> Vec2 {
    let [left, top, width, height] = rect;
    if width <= 0.0 || height <= 0.0 {
        return client;
    }
    let x_css = client.x - left;
    let y_css = client.y - top;
    Vec2::new(
        x_css / width * backing[0] as f32,
        y_css / height * backing[1] as f32,
    )
}

/// A gesture only ends once every finger has lifted; a partial lift is a
/// dip that freezes the pinch instead.
#[inline]
pub fn gesture_finished(remaining_touches: u32) -> bool {
    remaining_touches == 0
}

/// Active touches of `ev` in canvas pixels.
pub fn touch_points(ev: &web::TouchEvent, canvas: &web::HtmlCanvasElement) -> TouchPoints {
    let r = canvas.get_bounding_client_rect();
    let rect = [
        r.left() as f32,
        r.top() as f32,
        r.width() as f32,
        r.height() as f32,
    ];
    let backing = [canvas.width(), canvas.height()];
    let list = ev.touches();
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|t| {
            let client = Vec2::new(t.client_x() as f32, t.client_y() as f32);
            client_to_canvas_px(client, rect, backing)
        })
        .collect()
}
