use crate::core::errors::SessionError;
use crate::core::models::{BoundingBox, Point, Rect, Shape};

/// Box sent for a rectangle that was never dragged out, so a batch request stays well-formed.
pub const UNSET_REGION_PLACEHOLDER: BoundingBox = BoundingBox {
    min_x: 1.0,
    min_y: 1.0,
    max_x: 2.0,
    max_y: 2.0,
};

pub fn to_bounding_box(shape: &Shape) -> Result<BoundingBox, SessionError> {
    match shape {
        Shape::Box { rect } if rect.is_unset() => Ok(UNSET_REGION_PLACEHOLDER),
        Shape::Box { rect } => rect_bounds(rect),
        Shape::Polygon { points } => polygon_bounds(points),
    }
}

fn rect_bounds(rect: &Rect) -> Result<BoundingBox, SessionError> {
    let values = [rect.x, rect.y, rect.w, rect.h];
    if values.iter().any(|value| !value.is_finite()) {
        return Err(SessionError::InvalidGeometry(format!(
            "rectangle has non-finite coordinates: {:?}",
            rect
        )));
    }

    Ok(BoundingBox::new(
        rect.x,
        rect.y,
        rect.x + rect.w,
        rect.y + rect.h,
    ))
}

fn polygon_bounds(points: &[Point]) -> Result<BoundingBox, SessionError> {
    let Some(first) = points.first() else {
        return Err(SessionError::InvalidGeometry(
            "polygon has no points".to_string(),
        ));
    };

    if points
        .iter()
        .any(|point| !point.x.is_finite() || !point.y.is_finite())
    {
        return Err(SessionError::InvalidGeometry(
            "polygon has non-finite coordinates".to_string(),
        ));
    }

    let initial = BoundingBox::new(first.x, first.y, first.x, first.y);
    Ok(points.iter().fold(initial, |bounds, point| {
        BoundingBox::new(
            bounds.min_x.min(point.x),
            bounds.min_y.min(point.y),
            bounds.max_x.max(point.x),
            bounds.max_y.max(point.y),
        )
    }))
}
