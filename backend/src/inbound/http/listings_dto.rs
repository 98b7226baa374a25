//! Listing DTOs and request parsing helpers.

use chrono::{DateTime, SecondsFormat, Utc};
use pagination::{PageLimit, Paginated, PaginationLinks};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::listing_command_service::invalid_listing;
use crate::domain::{
    Error, Listing, ListingDetails, ListingFilter, ListingImage, ListingPatch, ListingQuery,
    NewImage, SellerType, Specifications, UserId,
};
use crate::inbound::http::validation::{
    FieldName, decode_image, explicit_null, parse_cursor, parse_range, parse_sort, split_list,
};

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Technical specification block.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecificationsDto {
    #[schema(example = "1998 cc")]
    pub engine: String,
    pub max_power: String,
    pub max_torque: String,
    pub fuel_tank: String,
    #[schema(example = 5)]
    pub seating_capacity: i32,
    pub boot_space: String,
    pub mileage: String,
    pub ground_clearance: String,
    pub color: String,
}

impl From<Specifications> for SpecificationsDto {
    fn from(value: Specifications) -> Self {
        Self {
            engine: value.engine,
            max_power: value.max_power,
            max_torque: value.max_torque,
            fuel_tank: value.fuel_tank,
            seating_capacity: value.seating_capacity,
            boot_space: value.boot_space,
            mileage: value.mileage,
            ground_clearance: value.ground_clearance,
            color: value.color,
        }
    }
}

impl From<SpecificationsDto> for Specifications {
    fn from(value: SpecificationsDto) -> Self {
        Self {
            engine: value.engine,
            max_power: value.max_power,
            max_torque: value.max_torque,
            fuel_tank: value.fuel_tank,
            seating_capacity: value.seating_capacity,
            boot_space: value.boot_space,
            mileage: value.mileage,
            ground_clearance: value.ground_clearance,
            color: value.color,
        }
    }
}

/// Stored image reference.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[schema(example = "listings/3fa85f64-5717-4562-b3fc-2c963f66afa6/1.jpg")]
    pub key: String,
    pub url: String,
}

impl From<ListingImage> for ImageResponse {
    fn from(image: ListingImage) -> Self {
        Self {
            key: image.key,
            url: image.url.into(),
        }
    }
}

/// Listing as returned by every listing endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: String,
    #[schema(example = "2019 Volkswagen Polo GT")]
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub old_price: Option<i64>,
    pub kilometers: i64,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub owners: i32,
    pub location: String,
    pub description: String,
    pub features: Vec<String>,
    pub specifications: SpecificationsDto,
    /// Always present; empty when the listing has no pictures.
    #[schema(max_items = 20)]
    pub images: Vec<ImageResponse>,
    pub seller_id: String,
    #[schema(example = "dealer")]
    pub seller_type: String,
    pub seller_name: String,
    pub seller_contact: String,
    pub is_new: bool,
    pub is_featured: bool,
    pub is_reduced: bool,
    pub created_at: String,
    pub updated_at: String,
    pub revision: u32,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        let Listing {
            id,
            details,
            seller,
            images,
            created_at,
            updated_at,
            revision,
        } = listing;
        Self {
            id: id.to_string(),
            title: details.title,
            brand: details.brand,
            model: details.model,
            year: details.year,
            price: details.price,
            old_price: details.old_price,
            kilometers: details.kilometers,
            fuel_type: details.fuel_type,
            transmission: details.transmission,
            body_type: details.body_type,
            owners: details.owners,
            location: details.location,
            description: details.description,
            features: details.features,
            specifications: details.specifications.into(),
            images: images.into_iter().map(ImageResponse::from).collect(),
            seller_id: seller.user_id.to_string(),
            seller_type: seller.seller_type.as_str().to_owned(),
            seller_name: seller.name,
            seller_contact: seller.contact,
            is_new: details.is_new,
            is_featured: details.is_featured,
            is_reduced: details.is_reduced,
            created_at: timestamp(created_at),
            updated_at: timestamp(updated_at),
            revision,
        }
    }
}

/// Navigation links of a listing page.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageLinksResponse {
    #[serde(rename = "self")]
    pub self_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Pagination envelope around listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingPageResponse {
    pub data: Vec<ListingResponse>,
    #[schema(example = 12)]
    pub limit: usize,
    pub links: PageLinksResponse,
}

impl From<Paginated<ListingResponse>> for ListingPageResponse {
    fn from(page: Paginated<ListingResponse>) -> Self {
        let PaginationLinks { self_, next } = page.links;
        Self {
            data: page.data,
            limit: page.limit,
            links: PageLinksResponse { self_, next },
        }
    }
}

/// Inline image upload: base64 payload, optionally as a `data:` URL.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    #[schema(example = "image/jpeg")]
    pub content_type: Option<String>,
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQSkZJRg==")]
    pub data: String,
}

pub(crate) fn decode_uploads(uploads: &[ImageUpload]) -> Result<Vec<NewImage>, Error> {
    uploads
        .iter()
        .enumerate()
        .map(|(index, upload)| decode_image(index, upload.content_type.as_deref(), &upload.data))
        .collect()
}

fn parse_seller_type(raw: &str) -> Result<SellerType, Error> {
    raw.parse::<SellerType>().map_err(invalid_listing)
}

/// Body of `POST /api/v1/listings`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingBody {
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    #[serde(default)]
    pub old_price: Option<i64>,
    #[serde(default)]
    pub kilometers: i64,
    #[serde(default)]
    pub fuel_type: String,
    #[serde(default)]
    pub transmission: String,
    #[serde(default)]
    pub body_type: String,
    #[serde(default)]
    pub owners: i32,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub specifications: SpecificationsDto,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_reduced: bool,
    #[schema(example = "individual")]
    pub seller_type: String,
    pub seller_name: String,
    pub seller_contact: String,
    #[serde(default)]
    #[schema(max_items = 20)]
    pub images: Vec<ImageUpload>,
}

/// Parsed create request minus the seller id, which comes from the session.
pub(crate) struct CreateListingParts {
    pub details: ListingDetails,
    pub seller_type: SellerType,
    pub seller_name: String,
    pub seller_contact: String,
    pub images: Vec<NewImage>,
}

impl TryFrom<CreateListingBody> for CreateListingParts {
    type Error = Error;

    fn try_from(body: CreateListingBody) -> Result<Self, Self::Error> {
        let seller_type = parse_seller_type(&body.seller_type)?;
        let images = decode_uploads(&body.images)?;
        Ok(Self {
            details: ListingDetails {
                title: body.title,
                brand: body.brand,
                model: body.model,
                year: body.year,
                price: body.price,
                old_price: body.old_price,
                kilometers: body.kilometers,
                fuel_type: body.fuel_type,
                transmission: body.transmission,
                body_type: body.body_type,
                owners: body.owners,
                location: body.location,
                description: body.description,
                features: body.features,
                specifications: body.specifications.into(),
                is_new: body.is_new,
                is_featured: body.is_featured,
                is_reduced: body.is_reduced,
            },
            seller_type,
            seller_name: body.seller_name,
            seller_contact: body.seller_contact,
            images,
        })
    }
}

/// Body of `PATCH /api/v1/listings/{id}`. Omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingBody {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    /// `null` clears the previous price.
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<i64>)]
    pub old_price: Option<Option<i64>>,
    pub kilometers: Option<i64>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub owners: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<SpecificationsDto>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_reduced: Option<bool>,
    pub seller_type: Option<String>,
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    /// Keys or URLs of attached images to delete.
    #[serde(default)]
    pub remove_images: Vec<String>,
    #[serde(default)]
    #[schema(max_items = 20)]
    pub new_images: Vec<ImageUpload>,
    /// Revision the client last read; a mismatch is a `409`.
    pub expected_revision: u32,
}

pub(crate) struct UpdateListingParts {
    pub patch: ListingPatch,
    pub new_images: Vec<NewImage>,
    pub remove_images: Vec<String>,
    pub expected_revision: u32,
}

impl TryFrom<UpdateListingBody> for UpdateListingParts {
    type Error = Error;

    fn try_from(body: UpdateListingBody) -> Result<Self, Self::Error> {
        let seller_type = body
            .seller_type
            .as_deref()
            .map(parse_seller_type)
            .transpose()?;
        let new_images = decode_uploads(&body.new_images)?;
        Ok(Self {
            patch: ListingPatch {
                title: body.title,
                brand: body.brand,
                model: body.model,
                year: body.year,
                price: body.price,
                old_price: body.old_price,
                kilometers: body.kilometers,
                fuel_type: body.fuel_type,
                transmission: body.transmission,
                body_type: body.body_type,
                owners: body.owners,
                location: body.location,
                description: body.description,
                features: body.features,
                specifications: body.specifications.map(Specifications::from),
                is_new: body.is_new,
                is_featured: body.is_featured,
                is_reduced: body.is_reduced,
                seller_type,
                seller_name: body.seller_name,
                seller_contact: body.seller_contact,
            },
            new_images,
            remove_images: body.remove_images,
            expected_revision: body.expected_revision,
        })
    }
}

/// Result of a listing update.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingResponseBody {
    pub listing: ListingResponse,
    /// Removed images whose objects could not be deleted.
    pub orphaned_keys: Vec<String>,
}

/// Query parameters of `GET /api/v1/listings`.
///
/// List filters take comma-separated values: `brand=BMW,Audi`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListingSearchParams {
    /// Comma-separated brands.
    pub brand: Option<String>,
    /// Comma-separated models.
    pub model: Option<String>,
    pub body_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    /// Price range, `"min-max"` or `"min+"`.
    pub price: Option<String>,
    /// Model year range, `"min-max"` or `"min+"`.
    pub year: Option<String>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
    /// `createdAt` (default), `price`, `year` or `kilometers`.
    pub sort: Option<String>,
    /// `asc` or `desc` (default).
    pub order: Option<String>,
    /// Page size, clamped to 1..=50.
    pub limit: Option<usize>,
    /// Opaque cursor from a previous page's `next` link.
    pub cursor: Option<String>,
}

impl ListingSearchParams {
    /// Build a domain query, optionally pinned to one seller's listings.
    pub(crate) fn into_query(self, seller: Option<UserId>) -> Result<ListingQuery, Error> {
        let filter = ListingFilter {
            brands: split_list(self.brand.as_deref()),
            models: split_list(self.model.as_deref()),
            body_types: split_list(self.body_type.as_deref()),
            fuel_types: split_list(self.fuel_type.as_deref()),
            transmissions: split_list(self.transmission.as_deref()),
            price: parse_range(self.price.as_deref(), FieldName::new("price"))?,
            year: parse_range(self.year.as_deref(), FieldName::new("year"))?,
            is_new: self.is_new,
            is_featured: self.is_featured,
            seller,
        };
        Ok(ListingQuery {
            filter,
            sort: parse_sort(self.sort.as_deref(), self.order.as_deref())?,
            limit: PageLimit::new(self.limit),
            after: parse_cursor(self.cursor.as_deref())?,
        })
    }
}
