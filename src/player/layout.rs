use super::types::Rect;

/// Computes the rectangle the video content actually occupies inside the
/// requested bounds.
///
/// With an unknown natural size the bounds are used verbatim as a
/// placeholder. With aspect preservation off the content stretches to fill
/// the bounds. Otherwise the content is scaled with integer floor division
/// to the largest size that fits, then centered; remainders bias the content
/// toward the top-left.
pub fn fit_rect(natural: (i32, i32), bounds: Rect, keep_aspect: bool) -> Rect {
    let (natural_width, natural_height) = natural;
    if natural_width == 0 || natural_height == 0 {
        return bounds;
    }

    if bounds.width != 0 && bounds.height != 0 {
        if !keep_aspect {
            return bounds;
        }
        let (visible_width, visible_height) =
            if natural_width * bounds.height > bounds.width * natural_height {
                // Content is wider than the box: letterbox.
                (bounds.width, bounds.width * natural_height / natural_width)
            } else {
                // Content is narrower or matches: pillarbox (or exact fit).
                (bounds.height * natural_width / natural_height, bounds.height)
            };
        Rect {
            left: bounds.left + (bounds.width - visible_width) / 2,
            top: bounds.top + (bounds.height - visible_height) / 2,
            width: visible_width,
            height: visible_height,
        }
    } else {
        // Degenerate bounds: show the content at its natural size.
        Rect {
            left: bounds.left,
            top: bounds.top,
            width: natural_width,
            height: natural_height,
        }
    }
}
